//! Interval auto-save with in-flight tracking.
//!
//! The engine hands the host a snapshot when a save is due; the host
//! persists it and reports back. Ticks that land while a save is still in
//! flight are skipped rather than overlapping it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveState {
    Idle,
    /// Saving the canvas as of this revision.
    InFlight { revision: u64 },
}

#[derive(Debug, Clone)]
pub struct AutoSave {
    interval_ms: u64,
    next_due: u64,
    state: SaveState,
    saved_revision: u64,
}

impl AutoSave {
    pub fn new(interval_ms: u64, now: u64) -> Self {
        Self {
            interval_ms,
            next_due: now + interval_ms,
            state: SaveState::Idle,
            saved_revision: 0,
        }
    }

    pub fn in_flight(&self) -> bool {
        matches!(self.state, SaveState::InFlight { .. })
    }

    /// Whether an interval save should start now. Advances the interval
    /// whenever it has elapsed, even if the tick is skipped.
    pub fn due(&mut self, now: u64, revision: u64) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval_ms;
        if self.in_flight() {
            log::debug!("AUTOSAVE skip tick, previous save in flight");
            return false;
        }
        revision != self.saved_revision
    }

    /// Mark a save of `revision` as started. `false` if one is already running.
    pub fn begin(&mut self, revision: u64) -> bool {
        if self.in_flight() {
            return false;
        }
        self.state = SaveState::InFlight { revision };
        true
    }

    /// Report the outcome of the save started by `begin`.
    pub fn finish(&mut self, result: Result<(), String>) {
        let SaveState::InFlight { revision } = self.state else {
            log::warn!("AUTOSAVE completion reported with no save in flight");
            return;
        };
        self.state = SaveState::Idle;
        match result {
            Ok(()) => self.saved_revision = revision,
            Err(e) => log::error!("AUTOSAVE failed, retrying next interval: {e}"),
        }
    }
}
