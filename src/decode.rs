//! Source image decoding
//!
//! Only PNG, GIF and JPEG sources can be packed. The format is picked by
//! sniffing the file header first and the extension second. SVG documents
//! are rejected outright rather than being handed to a raster decoder.

use crate::error::SpriteError;
use image::{ImageFormat, RgbaImage};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Number of leading bytes inspected when looking for an `<svg` tag.
const SVG_SNIFF_LEN: usize = 512;

/// Raster formats accepted as sprite sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Png,
    Gif,
    Jpeg,
}

impl SourceFormat {
    /// Match a file extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(SourceFormat::Png),
            "gif" => Some(SourceFormat::Gif),
            "jpg" | "jpeg" => Some(SourceFormat::Jpeg),
            _ => None,
        }
    }

    /// Identify the format from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Png => Some(SourceFormat::Png),
            ImageFormat::Gif => Some(SourceFormat::Gif),
            ImageFormat::Jpeg => Some(SourceFormat::Jpeg),
            _ => None,
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            SourceFormat::Png => ImageFormat::Png,
            SourceFormat::Gif => ImageFormat::Gif,
            SourceFormat::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Check whether the start of a buffer looks like an SVG document.
///
/// Scans whitespace separated words for an `<svg` token. Bytes that are not
/// valid UTF-8 mean the buffer is binary and therefore not SVG.
pub fn is_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SVG_SNIFF_LEN)];
    for word in head.split(|b| b.is_ascii_whitespace()).filter(|w| !w.is_empty()) {
        if word.starts_with(b"<svg") {
            return true;
        }
        if std::str::from_utf8(word).is_err() {
            return false;
        }
    }
    false
}

/// Extension of a path including the leading dot, or an empty string.
pub(crate) fn dotted_extension(path: &Path) -> String {
    path.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default()
}

/// Pick the decoder for a file.
pub fn detect(path: &Path, bytes: &[u8]) -> Result<SourceFormat, SpriteError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    if ext.eq_ignore_ascii_case("svg") || is_svg(bytes) {
        return Err(SpriteError::UnsupportedFormat { ext: dotted_extension(path) });
    }

    SourceFormat::sniff(bytes)
        .or_else(|| SourceFormat::from_extension(ext))
        .ok_or_else(|| SpriteError::UnsupportedFormat { ext: dotted_extension(path) })
}

/// Decode an in-memory image file to RGBA.
pub fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<RgbaImage, SpriteError> {
    let format = detect(path, bytes)?;
    image::load_from_memory_with_format(bytes, format.image_format())
        .map(|img| img.to_rgba8())
        .map_err(|source| SpriteError::Decode { path: path.to_path_buf(), source })
}

/// Read and decode one image file.
pub fn decode_file(path: &Path) -> Result<RgbaImage, SpriteError> {
    let bytes =
        fs::read(path).map_err(|source| SpriteError::Io { path: path.to_path_buf(), source })?;
    decode_bytes(path, &bytes)
}

/// Decode several files in parallel, keeping input order.
///
/// When more than one file fails, the error for the earliest path is returned.
pub fn decode_all(paths: &[PathBuf]) -> Result<Vec<RgbaImage>, SpriteError> {
    let decoded: Vec<Result<RgbaImage, SpriteError>> =
        paths.par_iter().map(|p| decode_file(p)).collect();
    decoded.into_iter().collect()
}
