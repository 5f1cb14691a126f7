//! Error types for the composer's boundary operations.
//!
//! Only the edges of the system can fail: uploads, storage and export.
//! Layer and history operations are total and never return these.

use thiserror::Error;

/// Rejected image upload. `Display` is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please upload a PNG file only.")]
    UnsupportedType { mime: String },

    #[error("File size must be less than {}MB.", .limit / (1024 * 1024))]
    TooLarge { size: usize, limit: usize },

    #[error("Error loading image. Please try a different file.")]
    Decode { reason: String },
}

/// Failure reading or writing the persisted document slot.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Storage(String),
}

/// Precondition failure for an editing action. `Display` is the transient
/// message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Canvas not ready. Please wait and try again.")]
    CanvasNotReady,

    #[error("No canvas or background image available")]
    NoBackground,
}

pub type PersistResult<T> = std::result::Result<T, PersistError>;
