pub mod config;
pub mod error;
pub mod history;
pub mod id;
pub mod layers;
pub mod model;
pub mod persist;
pub mod upload;

pub use config::{ComposerConfig, HighlightMode};
pub use error::{ComposeError, PersistError, PersistResult, UploadError};
pub use history::{History, Transition};
pub use id::LayerId;
pub use layers::{LayerAction, LayerChange, LayerStore, ReorderDirection, reduce};
pub use model::*;
pub use persist::{MemoryStorage, PersistenceBridge, Storage};
pub use upload::{UploadedImage, fit_display, probe_data_uri, validate_upload};
