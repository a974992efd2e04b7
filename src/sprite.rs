//! Sprite sheets - decode, pack, combine and export a set of images
//!
//! A [`Sprite`] owns one sheet from pattern resolution through to the PNG on
//! disk, and answers the position and size queries a stylesheet needs.
//!
//! # Lifecycle
//!
//! ```text
//! empty --decode--> decoded --(worker)--> combined --export/wait--> on disk
//! ```
//!
//! A failed decode leaves the sprite exactly as it was and queues nothing.
//! Decoding again replaces the image set and starts a new generation; exports
//! issued afterwards wait for the newest combine.
//!
//! # Example
//!
//! ```ignore
//! use spritepack::config::{Options, PackMode};
//! use spritepack::sprite::Sprite;
//!
//! let sprite = Sprite::new(Options::new("build", "images", "build/img").with_padding(10));
//! sprite.decode(&["icons/*.png"])?;
//! let export = sprite.export()?;
//! println!("{} at {}px {}px", sprite, -sprite.x(sprite.lookup("home")), -sprite.y(1));
//! export.wait()?;
//! ```

use crate::combine::{Combiner, Job};
use crate::config::{Options, PackMode};
use crate::decode::decode_all;
use crate::error::{ExportError, SpriteError};
use crate::export::{self, ExportHandle, ExportTask};
use crate::pack::{bounds, pack, Pos, Size};
use crate::resolve::{relative_path, resolve_patterns, to_slash};
use crate::sync::{lock, read, write};
use md5::{Digest, Md5};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Number of hex characters of the MD5 digest used in output names.
const HASH_LEN: usize = 6;

/// Everything a successful decode produces, replaced as one unit.
#[derive(Debug, Default)]
struct Decoded {
    generation: u64,
    patterns: Vec<String>,
    sizes: Vec<Size>,
    paths: Vec<String>,
    globs: Vec<PathBuf>,
}

/// Placement of one image in the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// File name without extension, usable with [`Sprite::lookup`]
    pub name: String,
    /// Path relative to the image directory
    pub path: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Sheet metadata for tooling that wants positions without a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetManifest {
    /// Output path relative to the build directory
    pub image: String,
    pub size: [i32; 2],
    pub pack: PackMode,
    pub padding: u32,
    pub frames: Vec<Frame>,
}

impl SheetManifest {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One sprite sheet and its background combine worker.
#[derive(Debug)]
pub struct Sprite {
    options: Options,
    decoded: RwLock<Decoded>,
    output_path: Mutex<Option<String>>,
    decode_lock: Mutex<()>,
    combiner: Combiner,
    pending: Mutex<Vec<Arc<ExportTask>>>,
    writes: Arc<AtomicUsize>,
}

impl Sprite {
    /// Create an empty sprite and start its combine worker.
    pub fn new(options: Options) -> Self {
        Self {
            options,
            decoded: RwLock::new(Decoded::default()),
            output_path: Mutex::new(None),
            decode_lock: Mutex::new(()),
            combiner: Combiner::spawn(),
            pending: Mutex::new(Vec::new()),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Resolve `patterns` against the image directory, decode every match and
    /// queue the set for combining.
    ///
    /// Nothing is replaced or queued unless every file decodes.
    pub fn decode<S: AsRef<str>>(&self, patterns: &[S]) -> Result<(), SpriteError> {
        let _serial = lock(&self.decode_lock);

        let resolved = resolve_patterns(&self.options.image_dir, patterns)?;
        let images = Arc::new(decode_all(&resolved.globs)?);
        let sizes = images.iter().map(Size::of).collect();

        let generation = {
            let mut decoded = write(&self.decoded);
            let generation = decoded.generation + 1;
            *decoded = Decoded {
                generation,
                patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
                sizes,
                paths: resolved.paths,
                globs: resolved.globs,
            };
            generation
        };
        lock(&self.output_path).take();

        debug!(generation, images = images.len(), "decoded sprite");
        self.combiner.submit(Job {
            generation,
            images,
            mode: self.options.pack,
            padding: self.options.padding,
        });
        Ok(())
    }

    /// Number of decoded images.
    pub fn len(&self) -> usize {
        read(&self.decoded).sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matched files relative to the image directory, in sheet order.
    pub fn paths(&self) -> Vec<String> {
        read(&self.decoded).paths.clone()
    }

    /// Matched files as found on disk, in sheet order.
    pub fn globs(&self) -> Vec<PathBuf> {
        read(&self.decoded).globs.clone()
    }

    /// Index of the image whose relative path, or file name without
    /// extension, equals `name`. The first match wins.
    pub fn position(&self, name: &str) -> Option<usize> {
        let decoded = read(&self.decoded);
        decoded.paths.iter().position(|path| {
            path == name || Path::new(path).file_stem().is_some_and(|stem| stem == name)
        })
    }

    /// Like [`position`](Self::position) but returns -1 when nothing matches.
    pub fn lookup(&self, name: &str) -> isize {
        self.position(name).map_or(-1, |i| i as isize)
    }

    /// Relative path of the image `name` refers to.
    pub fn file(&self, name: &str) -> Option<String> {
        let i = self.position(name)?;
        read(&self.decoded).paths.get(i).cloned()
    }

    fn pack(&self, i: isize) -> Pos {
        let decoded = read(&self.decoded);
        pack(self.options.pack, self.options.padding, &decoded.sizes, i)
    }

    /// Horizontal offset of image `i`.
    pub fn x(&self, i: isize) -> i32 {
        self.pack(i).x
    }

    /// Vertical offset of image `i`.
    pub fn y(&self, i: isize) -> i32 {
        self.pack(i).y
    }

    /// Total size of the sheet.
    pub fn dimensions(&self) -> Pos {
        let decoded = read(&self.decoded);
        bounds(self.options.pack, self.options.padding, &decoded.sizes)
    }

    fn size(&self, i: isize) -> Option<Size> {
        let i = usize::try_from(i).ok()?;
        read(&self.decoded).sizes.get(i).copied()
    }

    /// Width of image `i`, or -1 if out of range.
    pub fn image_width(&self, i: isize) -> i32 {
        self.size(i).map_or(-1, |s| s.width as i32)
    }

    /// Height of image `i`, or -1 if out of range.
    pub fn image_height(&self, i: isize) -> i32 {
        self.size(i).map_or(-1, |s| s.height as i32)
    }

    /// Width of the image `name` refers to, or -1.
    pub fn image_width_by_name(&self, name: &str) -> i32 {
        self.image_width(self.lookup(name))
    }

    /// Height of the image `name` refers to, or -1.
    pub fn image_height_by_name(&self, name: &str) -> i32 {
        self.image_height(self.lookup(name))
    }

    /// Whether the current image set has been combined.
    pub fn is_combined(&self) -> bool {
        let generation = read(&self.decoded).generation;
        generation > 0 && self.combiner.results().is_combined(generation)
    }

    /// Path of the sheet relative to the build directory.
    ///
    /// The name is the first six hex digits of an MD5 over the pack mode,
    /// padding, the relative image build directory and the requested
    /// patterns, so identical requests always share a file. Computed once
    /// per decode.
    ///
    /// When the generated image directory is the build directory itself the
    /// result is the bare file name (`<hash>.png`) with no directory prefix.
    pub fn output_path(&self) -> Result<String, SpriteError> {
        let mut cached = lock(&self.output_path);
        if let Some(path) = cached.as_ref() {
            return Ok(path.clone());
        }

        let patterns = read(&self.decoded).patterns.clone();
        if patterns.is_empty() {
            return Err(SpriteError::NoPattern);
        }

        let rel = relative_path(&self.options.build_dir, &self.options.gen_img_dir)
            .map(|p| to_slash(&p))
            .ok_or_else(|| SpriteError::RelativePath {
                base: self.options.build_dir.clone(),
                target: self.options.gen_img_dir.clone(),
            })?;

        let seed = format!(
            "{}{}|{}{}",
            self.options.pack,
            self.options.padding,
            rel,
            patterns.join("|")
        );
        let digest = format!("{:x}", Md5::digest(seed.as_bytes()));
        let name = format!("{}.png", &digest[..HASH_LEN]);

        let path = if rel.is_empty() { name } else { format!("{}/{}", rel, name) };
        *cached = Some(path.clone());
        Ok(path)
    }

    /// Start writing the sheet to the image build directory.
    ///
    /// Returns as soon as the destination is open; the write itself happens
    /// once the combine worker finishes. An existing file is left alone and
    /// reported as [`ExportOutcome::Skipped`](crate::export::ExportOutcome::Skipped).
    /// If another decode is combined before this export's sheet, the write
    /// fails with [`ExportError::Superseded`] and no file is left behind.
    pub fn export(&self) -> Result<ExportHandle, SpriteError> {
        // Path and generation must come from the same decode
        let _serial = lock(&self.decode_lock);
        let output = self.output_path()?;
        let file_name = Path::new(&output).file_name().map(PathBuf::from).unwrap_or_default();
        let target = self.options.gen_img_dir.join(file_name);

        let Some(file) = export::open_target(&target)? else {
            debug!(path = %target.display(), "sprite already exists, skipping write");
            return Ok(export::skipped(target));
        };

        let generation = read(&self.decoded).generation;
        let handle = export::spawn_write(
            file,
            target,
            self.combiner.results(),
            generation,
            Arc::clone(&self.writes),
        )?;
        lock(&self.pending).push(handle.task());
        Ok(handle)
    }

    /// Block until every export started so far has finished.
    ///
    /// Returns the first error any of them hit.
    pub fn wait(&self) -> Result<(), ExportError> {
        let pending = std::mem::take(&mut *lock(&self.pending));
        let mut first_error = None;
        for task in pending {
            if let Err(e) = task.wait() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Number of sheets this sprite has written to disk.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Placement of every image in sheet order.
    pub fn frames(&self) -> Vec<Frame> {
        let decoded = read(&self.decoded);
        decoded
            .paths
            .iter()
            .zip(&decoded.sizes)
            .enumerate()
            .map(|(i, (path, size))| {
                let at = pack(self.options.pack, self.options.padding, &decoded.sizes, i as isize);
                Frame {
                    name: Path::new(path)
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    path: path.clone(),
                    x: at.x,
                    y: at.y,
                    width: size.width,
                    height: size.height,
                }
            })
            .collect()
    }

    /// Sheet path, size and frames in one serialisable value.
    pub fn manifest(&self) -> SheetManifest {
        let size = self.dimensions();
        SheetManifest {
            image: self.to_string(),
            size: [size.x, size.y],
            pack: self.options.pack,
            padding: self.options.padding,
            frames: self.frames(),
        }
    }
}

impl fmt::Display for Sprite {
    /// The output path, or nothing if the sprite has not been decoded.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output_path().unwrap_or_default())
    }
}
