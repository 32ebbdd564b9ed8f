use std::path::{Path, PathBuf};

use thiserror::Error;

/// Sheet used for the player: four facing rows by four walk-cycle columns.
pub const PLAYER_SPRITE_KEY: &str = "characters/player";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetRefError {
    #[error("asset ref must not be empty")]
    Empty,
    #[error("asset ref must be relative")]
    Absolute,
    #[error("asset ref must use '/' separators")]
    Backslash,
    #[error("asset ref must not contain an empty or '..' segment")]
    BadSegment,
    #[error("asset ref contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Asset refs are lowercase slash-separated keys such as `buildings/bank`.
pub fn validate_asset_ref(key: &str) -> Result<(), AssetRefError> {
    if key.is_empty() {
        return Err(AssetRefError::Empty);
    }
    if key.starts_with('/') {
        return Err(AssetRefError::Absolute);
    }
    if key.contains('\\') {
        return Err(AssetRefError::Backslash);
    }
    if key.split('/').any(|segment| segment.is_empty() || segment == "..") {
        return Err(AssetRefError::BadSegment);
    }
    if let Some(character) = key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-' | '/')))
    {
        return Err(AssetRefError::InvalidCharacter { character });
    }
    Ok(())
}

/// `<assets>/base/sprites/<key>.png`
pub fn sprite_path(assets_dir: &Path, key: &str) -> Result<PathBuf, AssetRefError> {
    validate_asset_ref(key)?;
    Ok(assets_dir
        .join("base")
        .join("sprites")
        .join(format!("{key}.png")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_shipped_refs() {
        for key in ["buildings/bank", PLAYER_SPRITE_KEY, "ui/joystick-knob_2"] {
            assert!(validate_asset_ref(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_malformed_refs() {
        assert_eq!(validate_asset_ref(""), Err(AssetRefError::Empty));
        assert_eq!(validate_asset_ref("/etc/x"), Err(AssetRefError::Absolute));
        assert_eq!(validate_asset_ref(r"a\b"), Err(AssetRefError::Backslash));
        assert_eq!(validate_asset_ref("a/../b"), Err(AssetRefError::BadSegment));
        assert_eq!(validate_asset_ref("a//b"), Err(AssetRefError::BadSegment));
        assert_eq!(
            validate_asset_ref("Bank"),
            Err(AssetRefError::InvalidCharacter { character: 'B' })
        );
    }

    #[test]
    fn sprite_path_lands_under_base_sprites() {
        let path = sprite_path(Path::new("/game/assets"), "buildings/bank").expect("path");
        assert_eq!(path, Path::new("/game/assets/base/sprites/buildings/bank.png"));
        assert!(sprite_path(Path::new("/game/assets"), "../x").is_err());
    }
}
