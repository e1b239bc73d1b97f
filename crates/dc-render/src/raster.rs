//! Raster rendering of the annotation overlay.
//!
//! The overlay is first written as SVG (`svg::render_svg`), then parsed by
//! usvg and painted into a tiny-skia pixmap by resvg, so raster and vector
//! exports always agree, text included.

use crate::export::ExportError;
use crate::svg::render_svg;
use dc_core::{Color, DrawingObject};
use image::RgbaImage;
use kurbo::Size;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Fonts available to text objects. Native builds start from the system
/// fonts; wasm builds start empty until the host registers font data.
static FONTS: LazyLock<RwLock<Arc<fontdb::Database>>> = LazyLock::new(|| {
    let mut db = fontdb::Database::new();
    #[cfg(not(target_arch = "wasm32"))]
    db.load_system_fonts();
    bind_generic_families(&mut db);
    log::debug!("RASTER font database ready with {} faces", db.len());
    RwLock::new(Arc::new(db))
});

/// Point the generic `serif` / `sans-serif` families at an installed face
/// when fontdb's defaults (Times New Roman, Arial) are not present.
fn bind_generic_families(db: &mut fontdb::Database) {
    let Some(fallback) = db
        .faces()
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
    else {
        return;
    };
    let missing = |db: &fontdb::Database, family: fontdb::Family<'_>| {
        db.query(&fontdb::Query {
            families: &[family],
            ..fontdb::Query::default()
        })
        .is_none()
    };
    if missing(db, fontdb::Family::SansSerif) {
        db.set_sans_serif_family(fallback.clone());
    }
    if missing(db, fontdb::Family::Serif) {
        db.set_serif_family(fallback);
    }
}

/// Add a font (TTF/OTF/TTC bytes) for text in raster exports.
pub fn load_font_data(data: Vec<u8>) {
    let mut fonts = FONTS.write().unwrap_or_else(PoisonError::into_inner);
    let db = Arc::make_mut(&mut fonts);
    db.load_font_data(data);
    bind_generic_families(db);
    log::debug!("RASTER registered font data, {} faces", db.len());
}

fn font_database() -> Arc<fontdb::Database> {
    FONTS.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Render objects of a `size` canvas into a `width`×`height` RGBA image.
/// `multiplier` maps canvas units to device pixels.
pub fn rasterize(
    objects: &[DrawingObject],
    size: Size,
    width: u32,
    height: u32,
    multiplier: f64,
    background: Option<Color>,
) -> Result<RgbaImage, ExportError> {
    let svg = render_svg(objects, size, background);
    let mut options = usvg::Options::default();
    options.fontdb = font_database();
    let tree = usvg::Tree::from_str(&svg, &options)?;

    let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::Allocation { width, height })?;
    let m = multiplier as f32;
    resvg::render(&tree, Transform::from_scale(m, m), &mut pixmap.as_mut());

    let rgba = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(width, height, rgba).ok_or(ExportError::Allocation { width, height })
}
