//! Editor configuration.
//!
//! Hosts pass partial JSON; every key missing from it keeps its default.

use dc_annotate::AnnotationConfig;
use dc_core::{MAX_ZOOM, MIN_ZOOM};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Increment of the zoom buttons and ctrl/cmd +/− shortcuts.
    pub zoom_step: f64,
    /// Exponent per wheel pixel when a wheel gesture zooms.
    pub wheel_zoom_sensitivity: f64,
    /// Largest |deltaY| still treated as a trackpad pinch.
    pub pinch_wheel_max_delta: f64,
    /// Pointer travel (px) that turns a press into a drag.
    pub drag_threshold: f64,
    /// Target tags that never start a pan or drag.
    pub interactive_tags: Vec<String>,
    pub annotation: AnnotationConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: 0.1,
            wheel_zoom_sensitivity: 0.01,
            pinch_wheel_max_delta: 10.0,
            drag_threshold: 3.0,
            interactive_tags: ["node", "toolbar", "dock", "no-pan"]
                .into_iter()
                .map(String::from)
                .collect(),
            annotation: AnnotationConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.min_zoom) || !positive(self.max_zoom) {
            return Err(ConfigError::Invalid("zoom limits must be positive".into()));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "minZoom {} exceeds maxZoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !positive(self.zoom_step) || !positive(self.wheel_zoom_sensitivity) {
            return Err(ConfigError::Invalid("zoom step and sensitivity must be positive".into()));
        }
        if !(self.drag_threshold.is_finite() && self.drag_threshold >= 0.0) {
            return Err(ConfigError::Invalid("dragThreshold must be non-negative".into()));
        }
        self.annotation.validate().map_err(ConfigError::Invalid)
    }
}
