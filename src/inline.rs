//! Inline images as base64 data URIs
//!
//! Raster sources are re-encoded as PNG and wrapped in a CSS `url()`.
//! SVG documents are not handled here.

use crate::decode::{decode_bytes, is_svg};
use crate::error::SpriteError;
use crate::spritesheet::encode_png;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Inline the image at `path`.
///
/// # Examples
///
/// ```no_run
/// use spritepack::inline::inline_png;
/// use std::path::Path;
///
/// let css = inline_png(Path::new("images/dot.png")).unwrap();
/// assert!(css.starts_with("url(\"data:image/png;base64,"));
/// ```
pub fn inline_png(path: &Path) -> Result<String, SpriteError> {
    let bytes =
        fs::read(path).map_err(|source| SpriteError::Io { path: path.to_path_buf(), source })?;
    inline_bytes(path, &bytes)
}

/// Inline an image read from `reader`. The format is taken from the content.
pub fn inline_image<R: Read>(mut reader: R) -> Result<String, SpriteError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| SpriteError::Io { path: Default::default(), source })?;
    inline_bytes(Path::new(""), &bytes)
}

fn inline_bytes(path: &Path, bytes: &[u8]) -> Result<String, SpriteError> {
    if is_svg(bytes) {
        return Err(SpriteError::UnsupportedFormat { ext: ".svg".to_string() });
    }

    let image = decode_bytes(path, bytes)?;
    let png = encode_png(&image).map_err(|source| SpriteError::Encode { source })?;

    Ok(format!("url(\"data:image/png;base64,{}\")", STANDARD.encode(png)))
}
