//! Key bindings of the canvas.
//!
//! One table shared by every host, so the web component and the tests agree
//! on what a key press does.

use crate::input::Modifiers;
use dc_annotate::AnnotationTool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Tool(AnnotationTool),
    Undo,
    Redo,
    Delete,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    /// Back to the select tool, abandoning any gesture.
    Cancel,
}

/// Static binding table. `ctrl` and `meta` (⌘) are interchangeable.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Binding for a `KeyboardEvent.key` value under `modifiers`, if any.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if modifiers.command() {
            return Self::command_binding(key, modifiers.shift);
        }
        if modifiers.shift || modifiers.alt {
            return None;
        }
        let tool = match key.to_ascii_lowercase().as_str() {
            "v" => AnnotationTool::Select,
            "r" => AnnotationTool::Rectangle,
            "o" => AnnotationTool::Circle,
            "p" => AnnotationTool::Freehand,
            "t" => AnnotationTool::Text,
            "l" => AnnotationTool::Line,
            "a" => AnnotationTool::Arrow,
            _ => {
                return match key {
                    "Delete" | "Backspace" => Some(ShortcutAction::Delete),
                    "Escape" => Some(ShortcutAction::Cancel),
                    _ => None,
                };
            }
        };
        Some(ShortcutAction::Tool(tool))
    }

    fn command_binding(key: &str, shift: bool) -> Option<ShortcutAction> {
        match (key, shift) {
            ("z" | "Z", false) => Some(ShortcutAction::Undo),
            ("z" | "Z", true) | ("y" | "Y", false) => Some(ShortcutAction::Redo),
            // Shift+= arrives as "+" on most layouts.
            ("=" | "+", _) => Some(ShortcutAction::ZoomIn),
            ("-" | "_", false) => Some(ShortcutAction::ZoomOut),
            ("0", false) => Some(ShortcutAction::ResetZoom),
            _ => None,
        }
    }
}
