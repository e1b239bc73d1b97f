pub mod export;
pub mod hit;
pub mod raster;
pub mod svg;

pub use export::{ExportError, ExportFormat, ExportOptions, export_raster, export_svg};
pub use hit::{DiagramHit, hit_test_diagram, hit_test_objects};
pub use raster::load_font_data;
