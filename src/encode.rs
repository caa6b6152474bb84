//! Converts user-supplied image files into base64 payloads for the service.

use crate::error::{Result, StudioError};
use crate::types::{ImageFormat, SourceImage};
use base64::Engine;
use std::path::Path;

/// Reads an image file and encodes it for embedding in an outbound request.
///
/// The format is detected from the file's magic bytes, falling back to the
/// extension for truncated files. Fails with [`StudioError::Read`] when the
/// file cannot be read or is not PNG, JPEG, or WebP.
pub fn encode_image_file(path: impl AsRef<Path>) -> Result<SourceImage> {
    let path = path.as_ref();

    let bytes = std::fs::read(path)
        .map_err(|e| StudioError::Read(format!("{}: {e}", path.display())))?;

    let format = ImageFormat::from_magic_bytes(&bytes)
        .or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(ImageFormat::from_extension)
        })
        .ok_or_else(|| {
            StudioError::Read(format!(
                "{}: not a PNG, JPEG, or WebP image",
                path.display()
            ))
        })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(SourceImage {
        file_name,
        format,
        base64: base64::engine::general_purpose::STANDARD.encode(&bytes),
    })
}
