//! Glob pattern resolution against the image directory
//!
//! Patterns are matched relative to the configured image directory. A
//! pattern that matches nothing is retried once with `*` appended, so a bare
//! name like `139` finds `139.png`.

use crate::error::SpriteError;
use glob::{glob, Pattern};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Files matched by a set of patterns, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Matched files as found on disk (image directory joined with the match)
    pub globs: Vec<PathBuf>,
    /// The same files relative to the image directory, `/` separated
    pub paths: Vec<String>,
}

impl Resolved {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Resolve every pattern against `image_dir`.
///
/// # Errors
///
/// - [`SpriteError::NoPattern`] if `patterns` is empty
/// - [`SpriteError::InvalidPattern`] if a pattern is not a valid glob
/// - [`SpriteError::NoImages`] if nothing matched, even after the retry
pub fn resolve_patterns<S: AsRef<str>>(
    image_dir: &Path,
    patterns: &[S],
) -> Result<Resolved, SpriteError> {
    if patterns.is_empty() {
        return Err(SpriteError::NoPattern);
    }

    let mut resolved = Resolved::default();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let mut matches = match_files(image_dir, pattern)?;
        if matches.is_empty() {
            matches = match_files(image_dir, &format!("{}*", pattern))?;
            debug!(pattern, retried = true, matches = matches.len(), "resolved sprite pattern");
        } else {
            debug!(pattern, matches = matches.len(), "resolved sprite pattern");
        }

        for path in matches {
            resolved.paths.push(relative_to_image_dir(image_dir, &path));
            resolved.globs.push(path);
        }
    }

    if resolved.is_empty() {
        return Err(SpriteError::NoImages {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
        });
    }

    Ok(resolved)
}

/// Files matching one pattern, in the sorted order the glob walker yields them.
fn match_files(image_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, SpriteError> {
    let dir = image_dir.to_string_lossy();
    let full = if dir.is_empty() {
        pattern.to_string()
    } else {
        format!("{}/{}", Pattern::escape(dir.trim_end_matches('/')), pattern)
    };

    let entries = glob(&full).map_err(|source| SpriteError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => warn!("error reading path while matching '{}': {}", pattern, e),
        }
    }
    Ok(files)
}

fn relative_to_image_dir(image_dir: &Path, path: &Path) -> String {
    let rel = path
        .strip_prefix(image_dir)
        .ok()
        .map(Path::to_path_buf)
        .or_else(|| relative_path(image_dir, path))
        .unwrap_or_else(|| path.to_path_buf());
    to_slash(&rel)
}

/// Render a path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Lexically compute the path that leads from `base` to `target`.
///
/// Relative inputs are anchored at the current directory when the other side
/// is absolute. Returns `None` when no such path exists, e.g. when `base`
/// climbs above the point where the two diverge.
///
/// ```
/// use spritepack::resolve::relative_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(relative_path(Path::new("build"), Path::new("build/img")), Some(PathBuf::from("img")));
/// assert_eq!(relative_path(Path::new("build/css"), Path::new("build/img")), Some(PathBuf::from("../img")));
/// ```
pub fn relative_path(base: &Path, target: &Path) -> Option<PathBuf> {
    let (base, target) = if base.is_absolute() == target.is_absolute() {
        (normalize(base), normalize(target))
    } else {
        let cwd = std::env::current_dir().ok()?;
        (normalize(&cwd.join(base)), normalize(&cwd.join(target)))
    };

    let common = base.iter().zip(target.iter()).take_while(|(a, b)| a == b).count();
    if base[common..].iter().any(|c| c == "..") {
        return None;
    }

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for part in &target[common..] {
        rel.push(part);
    }
    Some(rel)
}

/// Split a path into components with `.` removed and `..` folded where possible.
fn normalize(path: &Path) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.last().is_some_and(|p| p != ".." && !p.ends_with('/')) {
                    parts.pop();
                } else {
                    parts.push("..".to_string());
                }
            }
            Component::RootDir => parts.push("/".to_string()),
            other => parts.push(other.as_os_str().to_string_lossy().into_owned()),
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::create_dir_all(dir.join("icons")).unwrap();
        for name in ["139.png", "140.png", "icons/home.png", "icons/search.png"] {
            RgbaImage::new(2, 2).save(dir.join(name)).unwrap();
        }
        temp
    }

    #[test]
    fn test_no_patterns() {
        let temp = fixture();
        let empty: [&str; 0] = [];
        let err = resolve_patterns(temp.path(), &empty).unwrap_err();
        assert!(matches!(err, SpriteError::NoPattern));
    }

    #[test]
    fn test_glob_matches_in_sorted_order() {
        let temp = fixture();
        let resolved = resolve_patterns(temp.path(), &["*.png"]).unwrap();
        assert_eq!(resolved.paths, vec!["139.png", "140.png"]);
        assert_eq!(resolved.globs, vec![temp.path().join("139.png"), temp.path().join("140.png")]);
    }

    #[test]
    fn test_bare_name_retried_with_wildcard() {
        let temp = fixture();
        let resolved = resolve_patterns(temp.path(), &["139"]).unwrap();
        assert_eq!(resolved.paths, vec!["139.png"]);
    }

    #[test]
    fn test_patterns_keep_request_order() {
        let temp = fixture();
        let resolved = resolve_patterns(temp.path(), &["icons/*.png", "140.png"]).unwrap();
        assert_eq!(resolved.paths, vec!["icons/home.png", "icons/search.png", "140.png"]);
    }

    #[test]
    fn test_no_images() {
        let temp = fixture();
        let err = resolve_patterns(temp.path(), &["notafile"]).unwrap_err();
        match err {
            SpriteError::NoImages { patterns } => assert_eq!(patterns, vec!["notafile"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_directories_are_not_matched() {
        let temp = fixture();
        let resolved = resolve_patterns(temp.path(), &["*"]).unwrap();
        assert!(!resolved.paths.iter().any(|p| p == "icons"));
    }

    #[test]
    fn test_invalid_pattern() {
        let temp = fixture();
        let err = resolve_patterns(temp.path(), &["[unclosed"]).unwrap_err();
        assert!(matches!(err, SpriteError::InvalidPattern { .. }));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path(Path::new("a"), Path::new("a")), Some(PathBuf::new()));
        assert_eq!(relative_path(Path::new("a/b"), Path::new("a/c/d")), Some(PathBuf::from("../c/d")));
        assert_eq!(relative_path(Path::new("/x/y"), Path::new("/x")), Some(PathBuf::from("..")));
        assert_eq!(relative_path(Path::new("./a/../b"), Path::new("b/img")), Some(PathBuf::from("img")));
        assert_eq!(relative_path(Path::new("../up"), Path::new("down")), None);
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("./a/b.png")), "a/b.png");
        assert_eq!(to_slash(Path::new("")), "");
    }
}
