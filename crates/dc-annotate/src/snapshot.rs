//! Serialized, restorable overlay state.
//!
//! Wire format: `{version, timestamp, canvasData, canvasSize}`. `canvasData`
//! is opaque to hosts; today it carries `{"objects": [...]}`.

use crate::error::AnnotationError;
use dc_core::DrawingObject;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Version written into every snapshot.
pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    pub version: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
    pub canvas_data: serde_json::Value,
    pub canvas_size: Size,
}

#[derive(Serialize)]
struct CanvasDataRef<'a> {
    objects: &'a [DrawingObject],
}

#[derive(Deserialize)]
struct CanvasData {
    #[serde(default)]
    objects: Vec<DrawingObject>,
}

impl CanvasState {
    /// Capture `objects` drawn on a canvas of `size`.
    pub fn capture(
        objects: &[DrawingObject],
        size: Size,
        timestamp: u64,
    ) -> Result<Self, AnnotationError> {
        let canvas_data =
            serde_json::to_value(CanvasDataRef { objects }).map_err(AnnotationError::Serialize)?;
        Ok(Self {
            version: SNAPSHOT_VERSION.to_string(),
            timestamp,
            canvas_data,
            canvas_size: size,
        })
    }

    /// An empty canvas of `size`.
    pub fn empty(size: Size, timestamp: u64) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            timestamp,
            canvas_data: serde_json::json!({ "objects": [] }),
            canvas_size: size,
        }
    }

    /// Decode the drawing objects. A version other than the current one is
    /// logged and decoding is attempted anyway.
    pub fn objects(&self) -> Result<Vec<DrawingObject>, AnnotationError> {
        if self.version != SNAPSHOT_VERSION {
            log::warn!(
                "SNAPSHOT version {:?} differs from {SNAPSHOT_VERSION:?}; attempting restore",
                self.version
            );
        }
        let data = CanvasData::deserialize(&self.canvas_data).map_err(AnnotationError::Deserialize)?;
        Ok(data.objects)
    }

    pub fn to_json(&self) -> Result<String, AnnotationError> {
        serde_json::to_string(self).map_err(AnnotationError::Serialize)
    }

    pub fn from_json(json: &str) -> Result<Self, AnnotationError> {
        serde_json::from_str(json).map_err(AnnotationError::Deserialize)
    }
}
