//! Annotation engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables of the annotation engine. Every field has a default, so hosts
/// may pass partial JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnotationConfig {
    /// Maximum number of undo snapshots kept. Oldest are evicted first.
    pub history_capacity: usize,
    /// Quiet period before a burst of high-frequency edits is snapshotted.
    pub save_debounce_ms: u64,
    /// Quiet period before a container resize rescales the objects.
    pub resize_debounce_ms: u64,
    /// Interval between auto-save attempts.
    pub auto_save_interval_ms: u64,
    /// Font size of newly placed text objects.
    pub text_font_size: f64,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            save_debounce_ms: 200,
            resize_debounce_ms: 16,
            auto_save_interval_ms: 2_500,
            text_font_size: 18.0,
        }
    }
}

impl AnnotationConfig {
    /// Describe the first invalid field, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.history_capacity == 0 {
            return Err("historyCapacity must be at least 1".into());
        }
        if self.auto_save_interval_ms == 0 {
            return Err("autoSaveIntervalMs must be positive".into());
        }
        if !(self.text_font_size.is_finite() && self.text_font_size > 0.0) {
            return Err("textFontSize must be a positive number".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let c: AnnotationConfig = serde_json::from_str(r#"{"historyCapacity": 10}"#).unwrap();
        assert_eq!(c.history_capacity, 10);
        assert_eq!(c.save_debounce_ms, 200);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let c = AnnotationConfig {
            history_capacity: 0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }
}
