//! Error types for decoding, exporting and caching sprite sheets

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned synchronously by [`Sprite`](crate::sprite::Sprite) operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpriteError {
    /// No glob pattern was given, or the sprite has not been decoded yet
    #[error("no glob pattern provided")]
    NoPattern,
    /// None of the patterns matched a file, even with a wildcard suffix
    #[error("no images matched for pattern: {}", .patterns.join(", "))]
    NoImages { patterns: Vec<String> },
    /// A pattern is not a valid glob
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    /// The file is not a PNG, GIF or JPEG
    #[error("format: {ext} not supported")]
    UnsupportedFormat { ext: String },
    /// The file looked like a supported image but failed to decode
    #[error("error processing: {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// Re-encoding a decoded image as PNG failed
    #[error("failed to encode image: {source}")]
    Encode {
        #[source]
        source: image::ImageError,
    },
    /// Reading a source image failed
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The generated image directory cannot be expressed relative to the build directory
    #[error("cannot make {} relative to {}", .target.display(), .base.display())]
    RelativePath { base: PathBuf, target: PathBuf },
    /// Creating the generated image directory failed
    #[error("failed to create image build dir {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Creating the output file failed for a reason other than it already existing
    #[error("failed to create file {}: {source}", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors observed when joining a pending export.
///
/// Cloneable so the same outcome can be reported both to the
/// [`ExportHandle`](crate::export::ExportHandle) and to
/// [`Sprite::wait`](crate::sprite::Sprite::wait).
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// Compositing or PNG encoding the sheet failed
    #[error("failed to combine sprite: {0}")]
    Combine(String),
    /// Writing the encoded sheet failed
    #[error("failed to write file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
    /// The write completed but nothing was written
    #[error("failed to write file: {}", .path.display())]
    EmptyWrite { path: PathBuf },
    /// The combine worker shut down before producing a result
    #[error("combine worker stopped before the sprite was combined")]
    WorkerStopped,
    /// A later decode was combined before this export's sheet was written
    #[error("sprite generation {generation} was superseded before it was written")]
    Superseded { generation: u64 },
    /// The export task panicked
    #[error("export task panicked")]
    Panicked,
    /// `wait_timeout` elapsed first
    #[error("timed out waiting for export")]
    TimedOut,
}
