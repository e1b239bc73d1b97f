pub mod autosave;
pub mod commit;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod resize;
pub mod snapshot;
pub mod surface;
pub mod theme;
pub mod tool;

pub use commit::{Commit, CommitQueue};
pub use config::AnnotationConfig;
pub use engine::{AnnotationEngine, DrawingFinished, EngineStatus};
pub use error::AnnotationError;
pub use history::{History, HistoryEntry, HistoryExport};
pub use snapshot::{CanvasState, SNAPSHOT_VERSION};
pub use surface::DrawingSurface;
pub use theme::{Theme, ThemePalette, ThemeSignals};
pub use tool::{AnnotationTool, Cursor, SurfaceMode, UnknownTool};
