//! Composer configuration.
//!
//! Every field has a default, so hosts may pass a partial JSON object
//! (or nothing at all).

use crate::model::LayerTemplate;
use serde::{Deserialize, Serialize};

/// Maximum number of snapshots the undo history keeps.
pub const DEFAULT_HISTORY_CAPACITY: usize = 25;

/// Autosave quiescence window.
pub const DEFAULT_AUTOSAVE_DELAY_MS: f64 = 2000.0;

/// Storage slot the document is saved under.
pub const DEFAULT_STORAGE_KEY: &str = "adomate-design";

/// Upload size ceiling (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// How the selected layer is made visible on the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightMode {
    /// Attach the engine's transform-handle widget.
    #[default]
    Handles,
    /// Draw a stroke around the node instead.
    Stroke,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComposerConfig {
    pub history_capacity: usize,
    pub autosave_delay_ms: f64,
    pub storage_key: String,
    /// Offset applied to both axes when a layer is duplicated.
    pub duplicate_offset: f64,
    pub nudge_step: f64,
    /// Nudge distance with Shift held.
    pub nudge_step_large: f64,
    pub max_upload_bytes: usize,
    pub max_display_width: f64,
    pub max_display_height: f64,
    pub highlight: HighlightMode,
    pub layer_template: LayerTemplate,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            storage_key: DEFAULT_STORAGE_KEY.into(),
            duplicate_offset: 20.0,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_display_width: 800.0,
            max_display_height: 600.0,
            highlight: HighlightMode::Handles,
            layer_template: LayerTemplate::default(),
        }
    }
}

impl ComposerConfig {
    /// Parse a (possibly partial) JSON config. Missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
