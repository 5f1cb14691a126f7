//! Background image intake: validation, decoding and display fitting.

use crate::config::ComposerConfig;
use crate::error::UploadError;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

pub const PNG_MIME: &str = "image/png";

/// An accepted upload, ready to become the document background.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    /// `data:image/png;base64,…` reference stored in the document.
    pub data_uri: String,
    /// Native pixel size.
    pub width: u32,
    pub height: u32,
    /// Size of the on-screen canvas.
    pub display_width: f64,
    pub display_height: f64,
}

/// Check one uploaded file and decode its dimensions.
///
/// Checks run cheapest first: MIME type, byte size, then a header decode.
/// Nothing is retained on rejection.
pub fn validate_upload(
    mime: &str,
    bytes: &[u8],
    config: &ComposerConfig,
) -> Result<UploadedImage, UploadError> {
    if !mime.trim().eq_ignore_ascii_case(PNG_MIME) {
        log::warn!("upload rejected: type `{mime}`");
        return Err(UploadError::UnsupportedType {
            mime: mime.to_string(),
        });
    }
    if bytes.len() > config.max_upload_bytes {
        log::warn!("upload rejected: {} bytes", bytes.len());
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            limit: config.max_upload_bytes,
        });
    }
    let (width, height) = png_dimensions(bytes)?;
    let (display_width, display_height) = fit_display(
        width,
        height,
        config.max_display_width,
        config.max_display_height,
    );
    log::debug!("upload accepted: {width}x{height} shown at {display_width}x{display_height}");
    Ok(UploadedImage {
        data_uri: format!("data:{PNG_MIME};base64,{}", BASE64.encode(bytes)),
        width,
        height,
        display_width,
        display_height,
    })
}

/// Fit `width`×`height` into `max_w`×`max_h`, keeping aspect ratio and
/// rounding to whole pixels. Fills the width first, then clamps the height.
pub fn fit_display(width: u32, height: u32, max_w: f64, max_h: f64) -> (f64, f64) {
    let aspect = width as f64 / height as f64;
    let mut w = max_w;
    let mut h = max_w / aspect;
    if h > max_h {
        h = max_h;
        w = max_h * aspect;
    }
    (w.round(), h.round())
}

/// Native pixel size of an image stored as a base64 data URI.
pub fn probe_data_uri(uri: &str) -> Result<(u32, u32), UploadError> {
    let payload = uri
        .split_once(";base64,")
        .map(|(_, p)| p)
        .ok_or_else(|| UploadError::Decode {
            reason: "not a base64 data URI".into(),
        })?;
    let bytes = BASE64.decode(payload.trim()).map_err(|e| UploadError::Decode {
        reason: e.to_string(),
    })?;
    png_dimensions(&bytes)
}

fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32), UploadError> {
    let (w, h) = ImageReader::with_format(Cursor::new(bytes), ImageFormat::Png)
        .into_dimensions()
        .map_err(|e| UploadError::Decode {
            reason: e.to_string(),
        })?;
    if w == 0 || h == 0 {
        return Err(UploadError::Decode {
            reason: "empty image".into(),
        });
    }
    Ok((w, h))
}
