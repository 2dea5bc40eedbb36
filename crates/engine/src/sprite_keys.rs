use thiserror::Error;

/// Longest key accepted for a sprite or sound name.
pub(crate) const MAX_SPRITE_KEY_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key is longer than {max} characters")]
    TooLong { max: usize },
    #[error("sprite key must be a bare file stem, found path separator '{separator}'")]
    PathSeparator { separator: char },
    #[error("sprite key must start with a lowercase letter")]
    InvalidStart,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Sprite and sound keys are flat file stems under the asset directories,
/// e.g. `fish_cod` for `assets/sprites/fish_cod.png`.
pub(crate) fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.len() > MAX_SPRITE_KEY_LEN {
        return Err(SpriteKeyError::TooLong {
            max: MAX_SPRITE_KEY_LEN,
        });
    }
    if let Some(separator) = key.chars().find(|ch| matches!(ch, '/' | '\\')) {
        return Err(SpriteKeyError::PathSeparator { separator });
    }
    if !key.starts_with(|ch: char| ch.is_ascii_lowercase()) {
        return Err(SpriteKeyError::InvalidStart);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-') {
            continue;
        }
        return Err(SpriteKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}
