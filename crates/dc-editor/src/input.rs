//! Input abstraction layer.
//!
//! Normalizes mouse, touch, wheel and keyboard events into a unified
//! `InputEvent` consumed by the session. Pointer coordinates are client
//! coordinates (relative to the page), as reported by the host.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    /// ctrl on most platforms, ⌘ on macOS.
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// One active touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: i32,
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Active touches; pan and pinch never need more than two inline.
pub type Touches = SmallVec<[TouchPoint; 2]>;

/// Unit of wheel deltas (`WheelEvent.deltaMode`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelEvent {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub delta_x: f64,
    pub delta_y: f64,
    #[serde(default)]
    pub delta_mode: DeltaMode,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl WheelEvent {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    /// Pointer pressed on the canvas. `target` is the host's tag for the
    /// element under the pointer, if any.
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        target: Option<String>,
    },
    PointerMove {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerUp {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Pointer released anywhere in the window, including outside the canvas.
    GlobalPointerUp,
    /// Click fired by the host after a press/release pair.
    Click {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Wheel(WheelEvent),
    TouchStart {
        touches: Touches,
        #[serde(default)]
        target: Option<String>,
    },
    TouchMove {
        touches: Touches,
    },
    /// `touches` holds the contacts still down.
    TouchEnd {
        touches: Touches,
    },
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    Key {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
            target: None,
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn click(x: f64, y: f64) -> Self {
        Self::Click {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
        }
    }

    /// Extract position if this is a single-pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Click { x, y, .. } => Some(Point::new(*x, *y)),
            Self::Wheel(w) => Some(w.position()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_parse_from_host_json() {
        let ev: InputEvent =
            serde_json::from_str(r#"{"type":"pointerDown","x":4,"y":5,"target":"toolbar"}"#).unwrap();
        assert_eq!(
            ev,
            InputEvent::PointerDown {
                x: 4.0,
                y: 5.0,
                modifiers: Modifiers::NONE,
                target: Some("toolbar".into()),
            }
        );

        let wheel: InputEvent =
            serde_json::from_str(r#"{"type":"wheel","x":1,"y":2,"deltaY":-3.5,"modifiers":{"ctrl":true}}"#).unwrap();
        let InputEvent::Wheel(w) = wheel else {
            panic!("expected wheel");
        };
        assert!(w.modifiers.command());
        assert_eq!(w.delta_mode, DeltaMode::Pixel);
    }

    #[test]
    fn touches_stay_inline() {
        let ev: InputEvent = serde_json::from_str(
            r#"{"type":"touchStart","touches":[{"id":1,"x":0,"y":0},{"id":2,"x":10,"y":0}]}"#,
        )
        .unwrap();
        let InputEvent::TouchStart { touches, .. } = ev else {
            panic!("expected touchStart");
        };
        assert_eq!(touches.len(), 2);
        assert!(!touches.spilled());
    }
}
