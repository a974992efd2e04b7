//! Sprite registry for memoizing built sheets
//!
//! The registry maps a [`SpriteKey`] (patterns, padding, pack mode) to the
//! [`Sprite`] built for it. The first request for a key decodes and exports
//! the sheet; every later request receives the same `Arc<Sprite>`. Entries
//! live as long as the registry, which is created once per compilation and
//! passed to whoever needs it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use tracing::trace;

use crate::config::{Options, PackMode};
use crate::error::{ExportError, SpriteError};
use crate::sprite::Sprite;
use crate::sync::{lock, read, write};

/// Identity of a sprite sheet request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpriteKey {
    /// Glob patterns in request order
    pub patterns: Vec<String>,
    pub padding: u32,
    pub pack: PackMode,
}

impl SpriteKey {
    pub fn new<S: AsRef<str>>(patterns: &[S], padding: u32, pack: PackMode) -> Self {
        Self { patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(), padding, pack }
    }
}

impl fmt::Display for SpriteKey {
    /// Canonical string form, e.g. `icons/*.png|10|horz`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.patterns.join(","), self.padding, self.pack)
    }
}

/// Per-key slot. Locked while the sheet for the key is being built so
/// concurrent requests for the same key wait instead of building twice.
type Slot = Arc<Mutex<Option<Arc<Sprite>>>>;

/// Thread-safe map of built sprite sheets.
#[derive(Debug, Default)]
pub struct SpriteRegistry {
    sprites: RwLock<HashMap<SpriteKey, Slot>>,
}

impl SpriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the sprite stored for `key`, if one has been built.
    pub fn get(&self, key: &SpriteKey) -> Option<Arc<Sprite>> {
        let slot = read(&self.sprites).get(key).cloned()?;
        let entry = lock(&slot);
        entry.clone()
    }

    /// Store `sprite` under `key`, replacing any previous entry.
    pub fn set(&self, key: SpriteKey, sprite: Arc<Sprite>) {
        write(&self.sprites).insert(key, Arc::new(Mutex::new(Some(sprite))));
    }

    /// Return the sprite for `key`, building it on first use.
    ///
    /// A build decodes `key.patterns` with `options` (pack mode and padding
    /// taken from the key) and starts the export. The write runs in the
    /// background; join it with [`Sprite::wait`]. A failed build stores
    /// nothing, so the next request tries again.
    pub fn get_or_build(
        &self,
        key: &SpriteKey,
        options: &Options,
    ) -> Result<Arc<Sprite>, SpriteError> {
        let slot = {
            let mut sprites = write(&self.sprites);
            Arc::clone(sprites.entry(key.clone()).or_default())
        };

        let mut entry = lock(&slot);
        if let Some(sprite) = entry.as_ref() {
            trace!(key = %key, "sprite registry hit");
            return Ok(Arc::clone(sprite));
        }

        trace!(key = %key, "sprite registry miss");
        let options = options.clone().with_pack(key.pack).with_padding(key.padding);
        let sprite = Arc::new(Sprite::new(options));
        sprite.decode(&key.patterns)?;
        let _export = sprite.export()?;

        *entry = Some(Arc::clone(&sprite));
        Ok(sprite)
    }

    /// Call `f` for every built sprite.
    pub fn for_each(&self, mut f: impl FnMut(&SpriteKey, &Arc<Sprite>)) {
        let slots: Vec<(SpriteKey, Slot)> =
            read(&self.sprites).iter().map(|(k, v)| (k.clone(), Arc::clone(v))).collect();
        for (key, slot) in slots {
            if let Some(sprite) = lock(&slot).as_ref() {
                f(&key, sprite);
            }
        }
    }

    /// Number of built sprites.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.for_each(|_, _| count += 1);
        count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every sprite's pending exports; returns the first error.
    pub fn wait_all(&self) -> Result<(), ExportError> {
        let mut sprites = Vec::new();
        self.for_each(|_, sprite| sprites.push(Arc::clone(sprite)));

        let mut first_error = None;
        for sprite in sprites {
            if let Err(e) = sprite.wait() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
