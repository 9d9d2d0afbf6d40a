//! Progress reporting and cooperative cancellation
//!
//! Every client operation takes a `&dyn Progress`. The paged loader polls
//! [`Progress::is_cancelled`] between pages and reports work through
//! [`Progress::advance`]; nothing ever interrupts an in-flight request.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Progress sink and cancellation signal supplied by the caller
pub trait Progress {
    /// Whether the caller asked for the operation to stop
    fn is_cancelled(&self) -> bool;

    /// Report `units` of completed work
    fn advance(&self, units: u64);

    /// Announce a task and the number of units it is expected to take
    fn begin(&self, _task: &str, _total_units: u64) {}

    /// Mark the current task as finished
    fn done(&self) {}
}

/// A progress sink that ignores reports and is never cancelled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn is_cancelled(&self) -> bool {
        false
    }

    fn advance(&self, _units: u64) {}
}

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    worked: AtomicU64,
    total: AtomicU64,
    task: Mutex<String>,
}

/// Shared cancellation flag that also records reported progress.
///
/// Clones share the same state, so one clone can be handed to the client
/// while another is cancelled from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
    }

    /// Units reported through `advance` so far
    pub fn worked(&self) -> u64 {
        self.state.worked.load(Ordering::SeqCst)
    }

    /// Total announced by the most recent `begin`
    pub fn total(&self) -> u64 {
        self.state.total.load(Ordering::SeqCst)
    }

    /// Name of the most recently announced task
    pub fn task(&self) -> String {
        self.state
            .task
            .lock()
            .map(|task| task.clone())
            .unwrap_or_default()
    }
}

impl Progress for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    fn advance(&self, units: u64) {
        self.state.worked.fetch_add(units, Ordering::SeqCst);
    }

    fn begin(&self, task: &str, total_units: u64) {
        self.state.total.store(total_units, Ordering::SeqCst);
        if let Ok(mut current) = self.state.task.lock() {
            *current = task.to_string();
        }
    }
}

/// A slice of a parent's progress.
///
/// The child owns `parent_units` of the parent's budget. Work reported
/// against the child's own total is scaled into that share, and the parent
/// never receives more than `parent_units` in total. Cancellation is read
/// straight from the parent.
pub struct SubProgress<'a> {
    parent: &'a dyn Progress,
    parent_units: u64,
    total: AtomicU64,
    worked: AtomicU64,
    forwarded: AtomicU64,
}

impl<'a> SubProgress<'a> {
    /// Claim `parent_units` of the parent's budget
    pub fn new(parent: &'a dyn Progress, parent_units: u64) -> Self {
        Self {
            parent,
            parent_units,
            total: AtomicU64::new(0),
            worked: AtomicU64::new(0),
            forwarded: AtomicU64::new(0),
        }
    }

    fn forward_up_to(&self, target: u64) {
        let target = target.min(self.parent_units);
        let previous = self.forwarded.fetch_max(target, Ordering::SeqCst);
        if target > previous {
            self.parent.advance(target - previous);
        }
    }
}

impl Progress for SubProgress<'_> {
    fn is_cancelled(&self) -> bool {
        self.parent.is_cancelled()
    }

    fn advance(&self, units: u64) {
        let worked = self.worked.fetch_add(units, Ordering::SeqCst) + units;
        let total = self.total.load(Ordering::SeqCst);
        if total == 0 {
            return;
        }
        let scaled = worked.min(total) * self.parent_units / total;
        self.forward_up_to(scaled);
    }

    fn begin(&self, _task: &str, total_units: u64) {
        self.total.store(total_units, Ordering::SeqCst);
    }

    fn done(&self) {
        self.forward_up_to(self.parent_units);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_progress_never_cancelled() {
        let progress = NoProgress;
        progress.advance(10);
        assert!(!progress.is_cancelled());
    }

    #[test]
    fn test_cancellation_token_shared_between_clones() {
        let token = CancellationToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());

        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancellation_token_records_work() {
        let token = CancellationToken::new();
        token.begin("Retrieving users", 120);
        token.advance(50);
        token.advance(50);

        assert_eq!(token.total(), 120);
        assert_eq!(token.worked(), 100);
        assert_eq!(token.task(), "Retrieving users");
    }

    #[test]
    fn test_sub_progress_scales_into_parent_share() {
        let parent = CancellationToken::new();
        let sub = SubProgress::new(&parent, 90);
        sub.begin("Retrieving users", 300);

        sub.advance(100);
        assert_eq!(parent.worked(), 30);

        sub.advance(200);
        assert_eq!(parent.worked(), 90);
    }

    #[test]
    fn test_sub_progress_never_exceeds_share() {
        let parent = CancellationToken::new();
        let sub = SubProgress::new(&parent, 5);
        sub.begin("Retrieving review groups", 2);

        sub.advance(10);
        sub.done();
        assert_eq!(parent.worked(), 5);
    }

    #[test]
    fn test_sub_progress_done_fills_remaining_share() {
        let parent = CancellationToken::new();
        let sub = SubProgress::new(&parent, 4);

        // no begin: nothing known about the size, work only counts on done
        sub.advance(3);
        assert_eq!(parent.worked(), 0);

        sub.done();
        assert_eq!(parent.worked(), 4);
    }

    #[test]
    fn test_sub_progress_reads_parent_cancellation() {
        let parent = CancellationToken::new();
        let sub = SubProgress::new(&parent, 1);
        assert!(!sub.is_cancelled());

        parent.cancel();
        assert!(sub.is_cancelled());
    }
}
