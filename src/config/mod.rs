//! Configuration module for sprite sheet options
//!
//! Provides types and parsing for `sprites.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
