//! Spritepack - sprite sheet engine for stylesheet compilers
//!
//! This library provides functionality to:
//! - Resolve glob patterns to source images and decode PNG, GIF and JPEG files
//! - Pack images vertically or horizontally with padding
//! - Composite the sheet on a background worker and export it as a PNG
//! - Answer per-image offset and size queries for generated CSS
//! - Memoize built sheets per compilation with [`SpriteRegistry`]
//!
//! # Example
//!
//! ```no_run
//! use spritepack::{Options, Sprite};
//!
//! let sprite = Sprite::new(Options::new("build", "images", "build/img"));
//! sprite.decode(&["icons/*.png"]).unwrap();
//! let handle = sprite.export().unwrap();
//!
//! let i = sprite.lookup("home");
//! println!("url({}) {}px {}px", sprite, -sprite.x(i), -sprite.y(i));
//! handle.wait().unwrap();
//! ```

pub mod combine;
pub mod config;
pub mod decode;
pub mod error;
pub mod export;
pub mod inline;
pub mod pack;
pub mod registry;
pub mod resolve;
pub mod sprite;
pub mod spritesheet;
mod sync;

pub use config::{Options, PackMode};
pub use error::{ExportError, SpriteError};
pub use export::{ExportHandle, ExportOutcome};
pub use pack::{Pos, Size};
pub use registry::{SpriteKey, SpriteRegistry};
pub use sprite::Sprite;
