//! Configuration schema types for `sprites.toml`
//!
//! Defines the options a sprite sheet is built with and their validation rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Sprite sheet layout direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PackMode {
    /// Images stacked top to bottom
    #[default]
    #[serde(rename = "vert", alias = "vertical")]
    Vertical,
    /// Images placed left to right
    #[serde(rename = "horz", alias = "horizontal")]
    Horizontal,
}

impl PackMode {
    /// Short name used in cache keys and output path hashing.
    pub fn as_str(&self) -> &'static str {
        match self {
            PackMode::Vertical => "vert",
            PackMode::Horizontal => "horz",
        }
    }
}

impl fmt::Display for PackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackMode {
    type Err = String;

    /// An empty name selects the vertical default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horz" | "horizontal" => Ok(PackMode::Horizontal),
            "vert" | "vertical" | "" => Ok(PackMode::Vertical),
            other => Err(format!("unknown pack mode '{}'", other)),
        }
    }
}

/// Options a sprite sheet is built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Directory stylesheets are written to; output paths are relative to it
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    /// Directory glob patterns are resolved against
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    /// Directory generated sheets are written to
    #[serde(default = "default_gen_img_dir")]
    pub gen_img_dir: PathBuf,
    /// Layout direction
    #[serde(default)]
    pub pack: PackMode,
    /// Gap between adjacent images in pixels
    #[serde(default)]
    pub padding: u32,
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_gen_img_dir() -> PathBuf {
    PathBuf::from("build/img")
}

impl Default for Options {
    fn default() -> Self {
        Self {
            build_dir: default_build_dir(),
            image_dir: default_image_dir(),
            gen_img_dir: default_gen_img_dir(),
            pack: PackMode::default(),
            padding: 0,
        }
    }
}

impl Options {
    /// Create options for the given directories with vertical packing and no padding.
    pub fn new(
        build_dir: impl Into<PathBuf>,
        image_dir: impl Into<PathBuf>,
        gen_img_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            build_dir: build_dir.into(),
            image_dir: image_dir.into(),
            gen_img_dir: gen_img_dir.into(),
            pack: PackMode::Vertical,
            padding: 0,
        }
    }

    /// Set the layout direction.
    pub fn with_pack(mut self, pack: PackMode) -> Self {
        self.pack = pack;
        self
    }

    /// Set the padding between images.
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Validate the options and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.image_dir.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "image_dir".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        if self.gen_img_dir.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "gen_img_dir".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        errors
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Name of the invalid field (e.g., "gen_img_dir")
    pub field: String,
    /// Error message
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sprites.toml: '{}' {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parse() {
        let options: Options = toml::from_str("").unwrap();
        assert_eq!(options, Options::default());
        assert_eq!(options.pack, PackMode::Vertical);
        assert_eq!(options.padding, 0);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
build_dir = "dist"
image_dir = "assets/img"
gen_img_dir = "dist/img"
pack = "horz"
padding = 10
"#;
        let options: Options = toml::from_str(toml).unwrap();
        assert_eq!(options.build_dir, PathBuf::from("dist"));
        assert_eq!(options.image_dir, PathBuf::from("assets/img"));
        assert_eq!(options.gen_img_dir, PathBuf::from("dist/img"));
        assert_eq!(options.pack, PackMode::Horizontal);
        assert_eq!(options.padding, 10);
    }

    #[test]
    fn test_pack_mode_long_names() {
        let options: Options = toml::from_str("pack = \"horizontal\"").unwrap();
        assert_eq!(options.pack, PackMode::Horizontal);
        let options: Options = toml::from_str("pack = \"vertical\"").unwrap();
        assert_eq!(options.pack, PackMode::Vertical);
    }

    #[test]
    fn test_pack_mode_unknown_rejected() {
        let result: Result<Options, _> = toml::from_str("pack = \"diagonal\"");
        assert!(result.is_err());
        assert!("diagonal".parse::<PackMode>().is_err());
    }

    #[test]
    fn test_pack_mode_from_str() {
        assert_eq!("horz".parse::<PackMode>(), Ok(PackMode::Horizontal));
        assert_eq!("vert".parse::<PackMode>(), Ok(PackMode::Vertical));
        assert_eq!("".parse::<PackMode>(), Ok(PackMode::Vertical));
        assert_eq!(PackMode::Horizontal.to_string(), "horz");
    }

    #[test]
    fn test_validate_empty_dirs() {
        let options = Options::new("build", "", "");
        let errors = options.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "image_dir");
        assert!(errors[1].to_string().contains("gen_img_dir"));
    }

    #[test]
    fn test_builder_setters() {
        let options =
            Options::new("b", "i", "g").with_pack(PackMode::Horizontal).with_padding(4);
        assert_eq!(options.pack, PackMode::Horizontal);
        assert_eq!(options.padding, 4);
        assert!(options.validate().is_empty());
    }
}
