//! Annotation tools and the surface mode each one puts the canvas in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The active annotation tool. Parsing accepts common aliases and always
/// normalizes to one of these canonical variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationTool {
    #[default]
    Select,
    Rectangle,
    Circle,
    Freehand,
    Line,
    Arrow,
    Text,
}

impl AnnotationTool {
    pub const ALL: [AnnotationTool; 7] = [
        AnnotationTool::Select,
        AnnotationTool::Rectangle,
        AnnotationTool::Circle,
        AnnotationTool::Freehand,
        AnnotationTool::Line,
        AnnotationTool::Arrow,
        AnnotationTool::Text,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationTool::Select => "select",
            AnnotationTool::Rectangle => "rectangle",
            AnnotationTool::Circle => "circle",
            AnnotationTool::Freehand => "freehand",
            AnnotationTool::Line => "line",
            AnnotationTool::Arrow => "arrow",
            AnnotationTool::Text => "text",
        }
    }

    /// Normalize a tool name, falling back to `Select` for unknown names.
    pub fn normalize(name: &str) -> Self {
        name.parse().unwrap_or_else(|e: UnknownTool| {
            log::warn!("{e}; falling back to select");
            AnnotationTool::Select
        })
    }

    /// The surface configuration this tool requires.
    pub fn surface_mode(self) -> SurfaceMode {
        match self {
            AnnotationTool::Select => SurfaceMode {
                drawing_mode: false,
                selection: true,
                skip_target_find: false,
                cursor: Cursor::Default,
            },
            AnnotationTool::Freehand => SurfaceMode {
                drawing_mode: true,
                selection: false,
                skip_target_find: true,
                cursor: Cursor::Crosshair,
            },
            AnnotationTool::Text => SurfaceMode {
                drawing_mode: false,
                selection: true,
                skip_target_find: false,
                cursor: Cursor::Text,
            },
            AnnotationTool::Rectangle
            | AnnotationTool::Circle
            | AnnotationTool::Line
            | AnnotationTool::Arrow => SurfaceMode {
                drawing_mode: false,
                selection: false,
                skip_target_find: true,
                cursor: Cursor::Crosshair,
            },
        }
    }
}

impl fmt::Display for AnnotationTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown annotation tool `{0}`")]
pub struct UnknownTool(pub String);

impl FromStr for AnnotationTool {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tool = match s.trim().to_ascii_lowercase().as_str() {
            "select" | "pointer" | "cursor" | "move" => AnnotationTool::Select,
            "rectangle" | "rect" | "square" | "box" => AnnotationTool::Rectangle,
            "circle" | "ellipse" | "oval" => AnnotationTool::Circle,
            "freehand" | "pen" | "pencil" | "draw" | "brush" => AnnotationTool::Freehand,
            "line" => AnnotationTool::Line,
            "arrow" => AnnotationTool::Arrow,
            "text" | "type" | "textbox" => AnnotationTool::Text,
            _ => return Err(UnknownTool(s.to_string())),
        };
        Ok(tool)
    }
}

/// Pointer cursor the host should show over the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    Default,
    Crosshair,
    Text,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Crosshair => "crosshair",
            Cursor::Text => "text",
        }
    }
}

/// How the drawing surface reacts to pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceMode {
    /// Native brush captures strokes.
    pub drawing_mode: bool,
    /// Objects can be picked and selected.
    pub selection: bool,
    /// Pointer events skip object hit-testing entirely.
    pub skip_target_find: bool,
    pub cursor: Cursor,
}

impl Default for SurfaceMode {
    fn default() -> Self {
        AnnotationTool::Select.surface_mode()
    }
}
