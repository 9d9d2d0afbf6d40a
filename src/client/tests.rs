//! Tests for the client facade
//!
//! A scripted transport records every call so the tests can assert on the
//! exact paths the client requests.

use super::query;
use super::*;
use crate::error::Error;
use crate::pagination::PageRequest;
use crate::progress::{CancellationToken, NoProgress};
use chrono::TimeZone;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::RefCell;
use test_case::test_case;

const INFO: &str = include_str!("../../tests/fixtures/info.json");

// ============================================================================
// Scripted transport
// ============================================================================

type Responder = Box<dyn Fn(&str) -> Result<String>>;

struct ScriptedTransport {
    calls: RefCell<Vec<String>>,
    respond: Responder,
    entry_point: bool,
    login_failure: Option<&'static str>,
}

impl ScriptedTransport {
    fn new(respond: impl Fn(&str) -> Result<String> + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            respond: Box::new(respond),
            entry_point: true,
            login_failure: None,
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get_text(&self, path: &str, _progress: &dyn Progress) -> Result<String> {
        self.calls.borrow_mut().push(format!("GET {path}"));
        (self.respond)(path)
    }

    fn get_bytes(&self, path: &str, mime_type: &str, _progress: &dyn Progress) -> Result<Bytes> {
        self.calls
            .borrow_mut()
            .push(format!("GET {path} accept={mime_type}"));
        Ok(Bytes::from_static(b"payload"))
    }

    fn put_form(
        &self,
        path: &str,
        params: &[(&str, &str)],
        _progress: &dyn Progress,
    ) -> Result<String> {
        let form: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        self.calls
            .borrow_mut()
            .push(format!("PUT {path} {}", form.join("&")));
        (self.respond)(path)
    }

    fn api_entry_point_exists(&self, _progress: &dyn Progress) -> Result<bool> {
        self.calls.borrow_mut().push("GET /api/".to_string());
        Ok(self.entry_point)
    }

    fn login(&self, username: &str, _password: &str, _progress: &dyn Progress) -> Result<()> {
        self.calls.borrow_mut().push(format!("LOGIN {username}"));
        match self.login_failure {
            Some(message) => Err(Error::server_reported(Some(104), message)),
            None => Ok(()),
        }
    }
}

/// `start` and `max-results` of a recorded page path
fn page_of(path: &str) -> PageRequest {
    let url = url::Url::parse(&format!("http://localhost{path}")).unwrap();
    let param = |name: &str| -> u32 {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.parse().unwrap())
            .unwrap()
    };
    PageRequest::new(param("start"), param("max-results"))
}

fn user(id: u32) -> serde_json::Value {
    json!({
        "id": id,
        "url": format!("/users/user{id}/"),
        "username": format!("user{id}"),
        "email": format!("user{id}@example.com"),
        "first_name": "User",
        "last_name": id.to_string(),
    })
}

fn review_request(id: u32) -> serde_json::Value {
    json!({
        "id": id,
        "status": "pending",
        "public": true,
        "summary": format!("Change {id}"),
        "description": "",
        "testing_done": "",
        "branch": "main",
        "changenum": null,
        "bugs_closed": [],
        "last_updated": "2010-06-21 13:03:32",
        "time_added": "2010-06-20 09:15:00",
        "target_people": [],
        "target_groups": [],
        "links": {"submitter": {"title": "admin"}}
    })
}

/// Serves `total` items from `key`, honouring `start`/`max-results`
fn collection(
    key: &'static str,
    total: u32,
    item: fn(u32) -> serde_json::Value,
) -> impl Fn(&str) -> Result<String> {
    move |path| {
        let request = page_of(path);
        let end = request.offset.saturating_add(request.limit).min(total);
        let items: Vec<_> = (request.offset.min(end)..end).map(item).collect();
        Ok(json!({"stat": "ok", "total_results": total, key: items}).to_string())
    }
}

fn metadata_server(path: &str) -> Result<String> {
    if path.starts_with(query::USERS) {
        collection("users", 120, user)(path)
    } else if path.starts_with(query::GROUPS) {
        Ok(json!({"stat": "ok", "total_results": 1, "groups": [{
            "id": 1, "name": "devgroup", "display_name": "Dev Group",
            "url": "/groups/devgroup/", "mailing_list": "devgroup@example.com"
        }]})
        .to_string())
    } else if path.starts_with(query::REPOSITORIES) {
        Ok(json!({"stat": "ok", "total_results": 1, "repositories": [{
            "id": 1, "name": "Review Board SVN", "tool": "Subversion",
            "path": "http://reviewboard.googlecode.com/svn"
        }]})
        .to_string())
    } else if path == query::SERVER_INFO {
        Ok(INFO.to_string())
    } else {
        Err(Error::http_status(404, path))
    }
}

// ============================================================================
// Query Tests
// ============================================================================

#[test_case("?status=pending&max-results=20", "?status=pending"; "trailing")]
#[test_case("?max-results=20&status=pending", "?status=pending"; "leading")]
#[test_case("?status=pending&max-results=20&to-users=alice", "?status=pending&to-users=alice"; "middle")]
#[test_case("?max-results=5&status=all&max-results=20", "?status=all"; "repeated")]
#[test_case("?max-results=20", ""; "only")]
#[test_case("?status=pending", "?status=pending"; "absent")]
#[test_case("", ""; "empty")]
fn test_strip_max_results(input: &str, expected: &str) {
    assert_eq!(query::strip_max_results(input), expected);
}

#[test]
fn test_review_request_search_has_single_max_results() {
    let path = query::review_request_search(
        "?status=pending&max-results=20",
        PageRequest::new(0, 10),
    );
    assert_eq!(path, "/api/review-requests/?status=pending&start=0&max-results=10");
    assert_eq!(path.matches("max-results").count(), 1);

    let path = query::review_request_search("", PageRequest::new(50, 50));
    assert_eq!(path, "/api/review-requests/?start=50&max-results=50");
}

#[test]
fn test_changed_since_encodes_timestamp() {
    let timestamp = Utc.with_ymd_and_hms(2010, 6, 21, 13, 3, 32).unwrap();
    assert_eq!(
        query::changed_since(&timestamp),
        "/api/review-requests/?status=all&max-results=10000&last-updated-from=2010-06-21+13%3A03%3A32"
    );
}

#[test]
fn test_screenshot_path_is_rooted() {
    assert_eq!(
        query::screenshot("uploaded/images/shot.png"),
        "/uploaded/images/shot.png"
    );
    assert_eq!(
        query::screenshot("/uploaded/images/shot.png"),
        "/uploaded/images/shot.png"
    );
}

// ============================================================================
// Paged Operation Tests
// ============================================================================

#[test]
fn test_users_single_page() {
    let client = ReviewboardClient::new(ScriptedTransport::new(collection("users", 4, user)));

    let users = client.users(&NoProgress).unwrap();

    assert_eq!(
        client.transport().calls(),
        vec!["GET /api/users/?start=0&max-results=50"]
    );
    assert_eq!(
        users.iter().map(|u| u.id).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
}

#[test]
fn test_users_walk_pages_with_configured_page_size() {
    let client = ReviewboardClient::new(ScriptedTransport::new(collection("users", 5, user)))
        .with_page_size(2);

    let users = client.users(&NoProgress).unwrap();

    assert_eq!(users.len(), 5);
    assert_eq!(
        client.transport().calls(),
        vec![
            "GET /api/users/?start=0&max-results=2",
            "GET /api/users/?start=2&max-results=2",
            "GET /api/users/?start=4&max-results=2",
        ]
    );
}

#[test]
fn test_review_requests_capped_and_stripped() {
    let client = ReviewboardClient::new(ScriptedTransport::new(collection(
        "review_requests",
        500,
        review_request,
    )));

    let requests = client
        .review_requests("?status=pending&max-results=20", 10, &NoProgress)
        .unwrap();

    assert_eq!(requests.len(), 10);
    assert_eq!(
        client.transport().calls(),
        vec!["GET /api/review-requests/?status=pending&start=0&max-results=10"]
    );
}

#[test]
fn test_review_requests_trims_ignored_limit() {
    // server ignores max-results and sends 20 at a time
    let client = ReviewboardClient::new(ScriptedTransport::new(|_: &str| {
        let items: Vec<_> = (0..20).map(review_request).collect();
        Ok(json!({"stat": "ok", "total_results": 500, "review_requests": items}).to_string())
    }));

    let requests = client
        .review_requests("?status=pending&max-results=20", 10, &NoProgress)
        .unwrap();

    assert_eq!(requests.len(), 10);
    assert_eq!(client.transport().calls().len(), 1);
}

#[test]
fn test_diff_comments_query_built_once() {
    let client = ReviewboardClient::new(ScriptedTransport::new(|_: &str| {
        Ok(r#"{"stat": "ok", "total_results": 0, "diff_comments": []}"#.to_string())
    }));

    let comments = client.diff_comments(8, 3, &NoProgress).unwrap();

    assert!(comments.is_empty());
    assert_eq!(
        client.transport().calls(),
        vec!["GET /api/review-requests/8/reviews/3/diff-comments/?start=0&max-results=50"]
    );
}

#[test]
fn test_paged_paths() {
    let client = ReviewboardClient::new(ScriptedTransport::new(|path: &str| {
        let key = if path.contains("/replies/") {
            "replies"
        } else if path.contains("screenshot-comments") {
            "screenshot_comments"
        } else {
            "reviews"
        };
        Ok(json!({"stat": "ok", "total_results": 0, key: []}).to_string())
    }));

    client.reviews(8, &NoProgress).unwrap();
    client.review_replies(8, 3, &NoProgress).unwrap();
    client.screenshot_comments(8, 2, &NoProgress).unwrap();

    assert_eq!(
        client.transport().calls(),
        vec![
            "GET /api/review-requests/8/reviews/?start=0&max-results=50",
            "GET /api/review-requests/8/reviews/3/replies/?start=0&max-results=50",
            "GET /api/review-requests/8/screenshots/2/screenshot-comments/?start=0&max-results=50",
        ]
    );
}

#[test]
fn test_page_failure_aborts_load() {
    let client = ReviewboardClient::new(ScriptedTransport::new(|path: &str| {
        if page_of(path).offset == 0 {
            collection("users", 120, user)(path)
        } else {
            Ok(r#"{"stat": "fail", "err": {"code": 101, "msg": "You don't have permission"}}"#
                .to_string())
        }
    }));

    let err = client.users(&NoProgress).unwrap_err();
    assert!(matches!(err, Error::ServerReported { code: Some(101), .. }));
}

// ============================================================================
// Single Resource Tests
// ============================================================================

#[test]
fn test_counts() {
    let client = ReviewboardClient::new(ScriptedTransport::new(|_: &str| {
        Ok(r#"{"stat": "ok", "count": 7}"#.to_string())
    }));

    assert_eq!(client.count_diff_comments(8, 3, &NoProgress).unwrap(), 7);
    assert_eq!(
        client.count_diff_comments_for_reply(8, 3, 4, &NoProgress).unwrap(),
        7
    );
    assert_eq!(
        client
            .count_screenshot_comments_for_reply(8, 3, 4, &NoProgress)
            .unwrap(),
        7
    );

    assert_eq!(
        client.transport().calls(),
        vec![
            "GET /api/review-requests/8/reviews/3/diff-comments/?counts-only=1",
            "GET /api/review-requests/8/reviews/3/replies/4/diff-comments/?counts-only=1",
            "GET /api/review-requests/8/reviews/3/replies/4/screenshot-comments/?counts-only=1",
        ]
    );
}

#[test]
fn test_review_request_and_lists() {
    let client = ReviewboardClient::new(ScriptedTransport::new(|path: &str| {
        Ok(match path {
            "/api/review-requests/8/" => {
                json!({"stat": "ok", "review_request": review_request(8)}).to_string()
            }
            "/api/review-requests/8/diffs/" => json!({"stat": "ok", "diffs": [
                {"id": 1, "revision": 1, "timestamp": "2010-06-20 09:15:00"}
            ]})
            .to_string(),
            _ => json!({"stat": "ok", "screenshots": []}).to_string(),
        })
    }));

    assert_eq!(client.review_request(8, &NoProgress).unwrap().id, 8);
    assert_eq!(client.diffs(8, &NoProgress).unwrap()[0].revision, 1);
    assert!(client.screenshots(8, &NoProgress).unwrap().is_empty());

    assert_eq!(
        client.transport().calls(),
        vec![
            "GET /api/review-requests/8/",
            "GET /api/review-requests/8/diffs/",
            "GET /api/review-requests/8/screenshots/",
        ]
    );
}

#[test]
fn test_binary_downloads() {
    let client = ReviewboardClient::new(ScriptedTransport::new(|_: &str| Ok(String::new())));

    assert_eq!(&client.raw_diff(8, 2, &NoProgress).unwrap()[..], b"payload");
    client
        .screenshot("uploaded/images/shot.png", &NoProgress)
        .unwrap();

    assert_eq!(
        client.transport().calls(),
        vec![
            "GET /api/review-requests/8/diffs/2/ accept=text/x-patch",
            "GET /uploaded/images/shot.png accept=image/*",
        ]
    );
}

#[test]
fn test_review_request_ids_changed_since() {
    let client = ReviewboardClient::new(ScriptedTransport::new(|_: &str| {
        Ok(r#"{"stat": "ok", "total_results": 2, "review_requests": [{"id": 4}, {"id": 9}]}"#
            .to_string())
    }));
    let since = Utc.with_ymd_and_hms(2010, 6, 21, 13, 3, 32).unwrap();

    let ids = client
        .review_request_ids_changed_since(&since, &NoProgress)
        .unwrap();

    assert_eq!(ids, vec![4, 9]);
    assert_eq!(
        client.transport().calls(),
        vec![format!("GET {}", query::changed_since(&since))]
    );
}

// ============================================================================
// Status Update Tests
// ============================================================================

#[test_case(ReviewRequestStatus::None; "none")]
#[test_case(ReviewRequestStatus::All; "all")]
fn test_update_status_rejects_filter_statuses(status: ReviewRequestStatus) {
    let client = ReviewboardClient::new(ScriptedTransport::new(|_: &str| {
        Ok(r#"{"stat": "ok"}"#.to_string())
    }));

    let err = client.update_status(8, status, &NoProgress).unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert!(client.transport().calls().is_empty());
}

#[test]
fn test_update_status_sends_form() {
    let client = ReviewboardClient::new(ScriptedTransport::new(|_: &str| {
        Ok(r#"{"stat": "ok", "review_request": {}}"#.to_string())
    }));

    client
        .update_status(8, ReviewRequestStatus::Submitted, &NoProgress)
        .unwrap();

    assert_eq!(
        client.transport().calls(),
        vec!["PUT /api/review-requests/8/ status=submitted"]
    );
}

#[test]
fn test_update_status_checks_write_response() {
    let client = ReviewboardClient::new(ScriptedTransport::new(|_: &str| {
        Ok(r#"{"stat": "fail", "err": {"code": 101, "msg": "You don't have permission"}}"#
            .to_string())
    }));

    let err = client
        .update_status(8, ReviewRequestStatus::Discarded, &NoProgress)
        .unwrap_err();
    assert_eq!(err.to_string(), "You don't have permission");
}

// ============================================================================
// Repository Data Tests
// ============================================================================

#[test]
fn test_update_repository_data() {
    let mut client = ReviewboardClient::new(ScriptedTransport::new(metadata_server));
    let token = CancellationToken::new();
    assert!(!client.has_repository_data());

    client.update_repository_data(false, &token).unwrap();

    let data = client.repository_data().unwrap();
    assert_eq!(data.users.len(), 120);
    assert_eq!(data.groups[0].name, "devgroup");
    assert_eq!(data.repositories[0].tool, "Subversion");
    assert_eq!(data.time_zone.as_deref(), Some("UTC"));
    assert_eq!(data.user("user7").map(|u| u.id), Some(7));

    assert_eq!(token.total(), 100);
    assert_eq!(token.worked(), 100);
    assert_eq!(
        client.transport().calls(),
        vec![
            "GET /api/users/?start=0&max-results=50",
            "GET /api/users/?start=50&max-results=50",
            "GET /api/users/?start=100&max-results=50",
            "GET /api/groups/?start=0&max-results=50",
            "GET /api/repositories/?start=0&max-results=50",
            "GET /api/info/",
        ]
    );
}

#[test]
fn test_update_repository_data_skipped_unless_forced() {
    let mut client = ReviewboardClient::new(ScriptedTransport::new(metadata_server));
    client.update_repository_data(false, &NoProgress).unwrap();
    let first = client.repository_data().unwrap();
    let fetches = client.transport().calls().len();

    client.update_repository_data(false, &NoProgress).unwrap();
    assert_eq!(client.transport().calls().len(), fetches);
    assert!(Arc::ptr_eq(&first, &client.repository_data().unwrap()));

    client.update_repository_data(true, &NoProgress).unwrap();
    assert_eq!(client.transport().calls().len(), fetches * 2);
    assert!(!Arc::ptr_eq(&first, &client.repository_data().unwrap()));
}

#[test]
fn test_failed_refresh_keeps_previous_snapshot() {
    let previous = Arc::new(RepositoryData {
        users: vec![],
        groups: vec![],
        repositories: vec![],
        time_zone: Some("Europe/Berlin".to_string()),
        last_updated: Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap(),
    });
    let mut client = ReviewboardClient::new(ScriptedTransport::new(|path: &str| {
        if path.starts_with(query::REPOSITORIES) {
            return Err(Error::http_status(500, "Internal Server Error"));
        }
        metadata_server(path)
    }))
    .with_repository_data(Arc::clone(&previous));

    let result = client.update_repository_data(true, &NoProgress);

    assert!(matches!(result, Err(Error::HttpStatus { status: 500, .. })));
    assert!(Arc::ptr_eq(&previous, &client.repository_data().unwrap()));
}

#[test]
fn test_cancelled_refresh_keeps_previous_snapshot() {
    let previous = Arc::new(RepositoryData {
        users: vec![],
        groups: vec![],
        repositories: vec![],
        time_zone: None,
        last_updated: Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap(),
    });
    let mut client = ReviewboardClient::new(ScriptedTransport::new(metadata_server))
        .with_repository_data(Arc::clone(&previous));
    let token = CancellationToken::new();
    token.cancel();

    client.update_repository_data(true, &token).unwrap();

    assert!(Arc::ptr_eq(&previous, &client.repository_data().unwrap()));
    assert_eq!(
        client.transport().calls(),
        vec!["GET /api/users/?start=0&max-results=50"]
    );
}

#[test]
fn test_refresh_stops_at_cancellation_between_fetches() {
    let token = CancellationToken::new();
    let canceller = token.clone();
    let mut client = ReviewboardClient::new(ScriptedTransport::new(move |path: &str| {
        if path.starts_with(query::GROUPS) {
            canceller.cancel();
        }
        metadata_server(path)
    }));

    client.update_repository_data(false, &token).unwrap();

    assert!(!client.has_repository_data());
    assert_eq!(
        client.transport().calls(),
        vec![
            "GET /api/users/?start=0&max-results=50",
            "GET /api/users/?start=50&max-results=50",
            "GET /api/users/?start=100&max-results=50",
            "GET /api/groups/?start=0&max-results=50",
        ]
    );
}

#[test]
fn test_snapshot_save_and_load() {
    let mut client = ReviewboardClient::new(ScriptedTransport::new(metadata_server));
    client.update_repository_data(false, &NoProgress).unwrap();
    let data = client.repository_data().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repository-data.json");
    assert!(RepositoryData::load_from_file(&path).unwrap().is_none());

    data.save_to_file(&path).unwrap();
    let loaded = RepositoryData::load_from_file(&path).unwrap().unwrap();

    assert_eq!(loaded, *data);
    assert!(!path.with_extension("tmp").exists());
    assert_eq!(loaded.group("devgroup").map(|g| g.id), Some(1));
    assert!(loaded.repository("Review Board SVN").is_some());
    assert!(loaded.user("nobody").is_none());

    let seeded = ReviewboardClient::new(ScriptedTransport::new(metadata_server))
        .with_repository_data(Arc::new(loaded));
    assert!(seeded.has_repository_data());
}

// ============================================================================
// Validation Tests
// ============================================================================

fn info_with_version(version: &'static str) -> impl Fn(&str) -> Result<String> {
    move |_| Ok(INFO.replace("\"1.5.2\"", &format!("\"{version}\"")))
}

#[test]
fn test_validate_ok() {
    let client = ReviewboardClient::new(ScriptedTransport::new(info_with_version("1.5.2")));
    let token = CancellationToken::new();

    let status = client.validate("alice", "secret", &token);

    assert_eq!(status, ValidationStatus::Ok);
    assert_eq!(token.worked(), 3);
    assert_eq!(
        client.transport().calls(),
        vec!["GET /api/", "LOGIN alice", "GET /api/info/"]
    );
}

#[test]
fn test_validate_missing_entry_point() {
    let mut transport = ScriptedTransport::new(info_with_version("1.5.2"));
    transport.entry_point = false;
    let client = ReviewboardClient::new(transport);

    let status = client.validate("alice", "secret", &NoProgress);

    assert!(status.message().unwrap().starts_with("Repository not found"));
    assert_eq!(client.transport().calls(), vec!["GET /api/"]);
}

#[test]
fn test_validate_login_failure() {
    let mut transport = ScriptedTransport::new(info_with_version("1.5.2"));
    transport.login_failure = Some("Login failed");
    let client = ReviewboardClient::new(transport);

    let status = client.validate("alice", "wrong", &NoProgress);

    assert_eq!(status, ValidationStatus::failed("Login failed"));
}

#[test_case("1.0.9"; "old major")]
#[test_case("1.4.2"; "old minor")]
fn test_validate_old_server(version: &'static str) {
    let client = ReviewboardClient::new(ScriptedTransport::new(info_with_version(version)));

    let status = client.validate("alice", "secret", &NoProgress);

    assert!(!status.is_ok());
    assert_eq!(
        status.message().unwrap(),
        format!("The version {version} is not supported. Please use a repository version of 1.5 or newer.")
    );
}

#[test_case("1.5"; "exact")]
#[test_case("1.6 beta 2"; "newer beta")]
#[test_case("2.0.1"; "newer major")]
fn test_validate_supported_server(version: &'static str) {
    let client = ReviewboardClient::new(ScriptedTransport::new(info_with_version(version)));
    assert!(client.validate("alice", "secret", &NoProgress).is_ok());
}

#[test]
fn test_validate_unexpected_error() {
    let client = ReviewboardClient::new(ScriptedTransport::new(|_: &str| {
        Err(Error::Other("boom".to_string()))
    }));

    let status = client.validate("alice", "secret", &NoProgress);

    assert_eq!(status, ValidationStatus::failed("Unexpected error: boom"));
}

#[test]
fn test_validate_malformed_info() {
    let client = ReviewboardClient::new(ScriptedTransport::new(|_: &str| Ok(String::new())));

    let status = client.validate("alice", "secret", &NoProgress);

    assert_eq!(status, ValidationStatus::failed("The response is empty."));
}
