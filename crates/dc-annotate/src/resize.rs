//! Debounced container-size tracking.

use dc_core::{ResizeScale, calculate_resize_scale};
use kurbo::Size;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingResize {
    size: Size,
    due: u64,
}

/// Collapses bursts of observed sizes into one rescale per quiet period.
#[derive(Debug, Clone)]
pub struct ResizeTracker {
    debounce_ms: u64,
    applied: Size,
    pending: Option<PendingResize>,
}

impl ResizeTracker {
    pub fn new(size: Size, debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            applied: size,
            pending: None,
        }
    }

    /// Size the objects are currently laid out for.
    pub fn applied(&self) -> Size {
        self.applied
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record an observed container size.
    pub fn observe(&mut self, size: Size, now: u64) {
        let usable = size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0;
        if !usable {
            log::trace!("RESIZE ignore {size:?}");
            return;
        }
        if size == self.applied {
            self.pending = None;
            return;
        }
        self.pending = Some(PendingResize {
            size,
            due: now + self.debounce_ms,
        });
    }

    /// The rescale to apply if the quiet period has elapsed.
    pub fn poll(&mut self, now: u64) -> Option<(Size, ResizeScale)> {
        match self.pending {
            Some(p) if p.due <= now => self.apply(p.size),
            _ => None,
        }
    }

    /// Apply any pending size immediately.
    pub fn flush(&mut self) -> Option<(Size, ResizeScale)> {
        let p = self.pending?;
        self.apply(p.size)
    }

    /// Forget pending sizes and treat `size` as applied.
    pub fn reset(&mut self, size: Size) {
        self.applied = size;
        self.pending = None;
    }

    fn apply(&mut self, size: Size) -> Option<(Size, ResizeScale)> {
        self.pending = None;
        let scale = calculate_resize_scale(self.applied, size);
        self.applied = size;
        Some((size, scale))
    }
}
