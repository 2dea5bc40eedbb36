use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::sprite_keys::validate_sprite_key;

use super::geometry::SpriteBounds;

/// Bounds used for a sprite name that has no texture on disk.
pub const PLACEHOLDER_SPRITE_BOUNDS: SpriteBounds = SpriteBounds {
    width: 32.0,
    height: 32.0,
};

/// Texture and sound lookup by name. Decoding and playback stay behind it.
pub trait AssetProvider {
    fn sprite_bounds(&self, name: &str) -> Option<SpriteBounds>;
    fn has_sound(&self, name: &str) -> bool;
    fn play_sound(&self, name: &str);
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read asset directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read image dimensions from {path}: {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Directory-backed asset index: `sprites/*.png` and `audio/*.wav`, keyed by
/// file stem.
#[derive(Debug, Default, Clone)]
pub struct AssetRegistry {
    sprites: BTreeMap<String, SpriteBounds>,
    sounds: BTreeSet<String>,
}

impl AssetRegistry {
    pub fn scan(sprites_dir: &Path, audio_dir: &Path) -> Result<Self, AssetError> {
        let mut registry = Self::default();

        for path in files_with_extension(sprites_dir, "png")? {
            let Some(name) = asset_name(&path) else {
                continue;
            };
            let (width, height) =
                image::image_dimensions(&path).map_err(|source| AssetError::ReadImage {
                    path: path.clone(),
                    source,
                })?;
            registry.insert_sprite(
                &name,
                SpriteBounds {
                    width: width as f32,
                    height: height as f32,
                },
            );
        }

        for path in files_with_extension(audio_dir, "wav")? {
            if let Some(name) = asset_name(&path) {
                registry.sounds.insert(name);
            }
        }

        info!(
            sprite_count = registry.sprites.len(),
            sound_count = registry.sounds.len(),
            sprites_dir = %sprites_dir.display(),
            audio_dir = %audio_dir.display(),
            "assets_indexed"
        );
        Ok(registry)
    }

    pub fn insert_sprite(&mut self, name: &str, bounds: SpriteBounds) {
        self.sprites.insert(name.to_string(), bounds);
    }

    pub fn insert_sound(&mut self, name: &str) {
        self.sounds.insert(name.to_string());
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }
}

impl AssetProvider for AssetRegistry {
    fn sprite_bounds(&self, name: &str) -> Option<SpriteBounds> {
        self.sprites.get(name).copied()
    }

    fn has_sound(&self, name: &str) -> bool {
        self.sounds.contains(name)
    }

    fn play_sound(&self, name: &str) {
        if self.has_sound(name) {
            debug!(sound = name, "sound_played");
        } else {
            warn!(sound = name, "sound_missing");
        }
    }
}

fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, AssetError> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "asset_dir_missing");
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|source| AssetError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| AssetError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn asset_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    match validate_sprite_key(stem) {
        Ok(()) => Some(stem.to_string()),
        Err(error) => {
            warn!(path = %path.display(), error = %error, "asset_name_rejected");
            None
        }
    }
}
