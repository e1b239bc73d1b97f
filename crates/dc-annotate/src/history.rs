//! Bounded linear undo/redo history.
//!
//! A ring buffer of snapshots with a cursor pointing at the state currently
//! shown. Pushing after an undo discards the redoable tail (no branching);
//! pushing past capacity evicts the oldest entry.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of snapshots kept.
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry<T> {
    pub state: T,
    pub timestamp: u64,
}

#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<HistoryEntry<T>>,
    /// Index of the current entry; `None` only while empty.
    cursor: Option<usize>,
    capacity: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> History<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: None,
            capacity,
        }
    }

    /// Record a new current state, discarding anything redoable.
    pub fn push(&mut self, state: T, timestamp: u64) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push_back(HistoryEntry { state, timestamp });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step back and return the state to restore.
    pub fn undo(&mut self) -> Option<&T> {
        let c = self.cursor.filter(|&c| c > 0)?;
        self.cursor = Some(c - 1);
        self.entries.get(c - 1).map(|e| &e.state)
    }

    /// Step forward and return the state to restore.
    pub fn redo(&mut self) -> Option<&T> {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next >= self.entries.len() {
            return None;
        }
        self.cursor = Some(next);
        self.entries.get(next).map(|e| &e.state)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.entries.len()
    }

    pub fn current(&self) -> Option<&T> {
        self.cursor
            .and_then(|c| self.entries.get(c))
            .map(|e| &e.state)
    }

    /// Cursor as exposed to hosts: `-1` when empty.
    pub fn cursor(&self) -> isize {
        self.cursor.map_or(-1, |c| c as isize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry<T>> {
        self.entries.iter()
    }
}

impl<T: Clone> History<T> {
    pub fn export(&self) -> HistoryExport<T> {
        HistoryExport {
            entries: self.entries.iter().cloned().collect(),
            cursor: self.cursor(),
        }
    }
}

impl<T> History<T> {
    /// Replace the whole history. Entries beyond capacity are dropped from
    /// the oldest end; the cursor follows the entry it pointed at.
    pub fn import(&mut self, export: HistoryExport<T>) -> Result<(), String> {
        let HistoryExport { entries, cursor } = export;
        let len = entries.len() as isize;
        let valid = if len == 0 { cursor == -1 } else { (0..len).contains(&cursor) };
        if !valid {
            return Err(format!("cursor {cursor} out of range for {len} entries"));
        }

        let mut entries: VecDeque<_> = entries.into();
        let overflow = entries.len().saturating_sub(self.capacity);
        entries.drain(..overflow);
        let cursor = if cursor < 0 {
            None
        } else {
            let shifted = cursor - overflow as isize;
            if shifted < 0 {
                log::warn!("HISTORY import cursor {cursor} fell off the front; clamped to oldest entry");
            }
            Some(shifted.max(0) as usize)
        };

        self.entries = entries;
        self.cursor = cursor;
        log::debug!("HISTORY imported {} entries, cursor {}", self.entries.len(), self.cursor());
        Ok(())
    }
}

/// Whole-history transfer format, e.g. across a fullscreen remount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryExport<T> {
    pub entries: Vec<HistoryEntry<T>>,
    pub cursor: isize,
}

impl<T: Serialize> HistoryExport<T> {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Compact MessagePack encoding (field names kept).
    pub fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }
}

impl<T: DeserializeOwned> HistoryExport<T> {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}
