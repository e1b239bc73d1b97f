//! Serialized commit queue for history snapshots.
//!
//! Every mutating gesture enqueues a `Commit`. The queue applies one policy:
//! immediate commits are due at once, debounced ones become due after a
//! quiet period (each new debounced commit restarts it), and both kinds
//! coalesce into a single snapshot. While suspended (undo/redo replay) the
//! queue drops everything it is given.

/// How urgently a mutation must reach history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Discrete action: clear, finalize, delete.
    Immediate,
    /// High-frequency action: moving or resizing an object.
    Debounced,
}

#[derive(Debug, Clone)]
pub struct CommitQueue {
    debounce_ms: u64,
    ready: bool,
    deadline: Option<u64>,
    suspended: bool,
}

impl CommitQueue {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            ready: false,
            deadline: None,
            suspended: false,
        }
    }

    /// Queue a commit. Returns `false` when dropped because the queue is
    /// suspended.
    pub fn enqueue(&mut self, commit: Commit, now: u64) -> bool {
        if self.suspended {
            log::trace!("COMMIT drop {commit:?} during replay");
            return false;
        }
        match commit {
            Commit::Immediate => self.ready = true,
            Commit::Debounced => self.deadline = Some(now + self.debounce_ms),
        }
        true
    }

    /// Take the pending snapshot request if one is due at `now`.
    pub fn poll(&mut self, now: u64) -> bool {
        let due = self.ready || self.deadline.is_some_and(|d| d <= now);
        if due {
            self.ready = false;
            self.deadline = None;
        }
        due
    }

    /// Take any pending request regardless of deadlines.
    pub fn flush(&mut self) -> bool {
        let pending = self.is_pending();
        self.ready = false;
        self.deadline = None;
        pending
    }

    /// Drop pending requests without snapshotting.
    pub fn cancel(&mut self) {
        if self.is_pending() {
            log::trace!("COMMIT cancel pending");
        }
        self.ready = false;
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.ready || self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Stop accepting commits until `resume`. Pending requests are dropped.
    pub fn suspend(&mut self) {
        self.cancel();
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}
