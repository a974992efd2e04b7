//! Configuration loading and discovery for `sprites.toml`
//!
//! Provides functions to find and load sprite options.

use super::schema::Options;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file searched for by [`find_config_from`].
pub const CONFIG_FILE_NAME: &str = "sprites.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse sprites.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Find sprites.toml by walking up from a specific directory.
///
/// # Returns
/// - `Some(path)` if a sprites.toml file is found
/// - `None` if the filesystem root is reached first
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load options from a sprites.toml file.
///
/// Relative directories in the file are resolved against the directory
/// containing it, so the same file works regardless of the working directory.
pub fn load_options(path: &Path) -> Result<Options, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let mut options = parse_options(&contents)?;

    if let Some(root) = path.parent() {
        options.build_dir = resolve_path(root, &options.build_dir);
        options.image_dir = resolve_path(root, &options.image_dir);
        options.gen_img_dir = resolve_path(root, &options.gen_img_dir);
    }

    Ok(options)
}

/// Parse and validate options from TOML text.
pub fn parse_options(contents: &str) -> Result<Options, ConfigError> {
    let options: Options = toml::from_str(contents)?;

    let errors = options.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(options)
}

/// Resolve a path relative to the config root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the root.
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || root.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackMode;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(b"padding = 2")
            .expect("should write config content");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(b"padding = 2")
            .expect("should write config content");

        let subdir = temp.path().join("sass").join("partials");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_load_options_resolves_relative_dirs() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "image_dir = \"img\"\ngen_img_dir = \"/abs/out\"\npack = \"horz\"")
            .expect("should write config");

        let options = load_options(&config_path).expect("should load");
        assert_eq!(options.image_dir, temp.path().join("img"));
        assert_eq!(options.build_dir, temp.path().join("build"));
        assert_eq!(options.gen_img_dir, PathBuf::from("/abs/out"));
        assert_eq!(options.pack, PackMode::Horizontal);
    }

    #[test]
    fn test_load_options_missing_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let err = load_options(&temp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_options_invalid_toml() {
        let err = parse_options("padding = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_parse_options_validation() {
        let err = parse_options("image_dir = \"\"").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("image_dir"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
