pub mod config;
pub mod graph;
pub mod input;
pub mod session;
pub mod shortcuts;
pub mod viewport;

pub use config::{ConfigError, EditorConfig};
pub use graph::GraphController;
pub use input::{DeltaMode, InputEvent, Modifiers, TouchPoint, Touches, WheelEvent};
pub use session::{FinishEvent, Session};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use viewport::{InteractiveRegion, PinchBaseline, ViewportController};
