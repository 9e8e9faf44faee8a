//! Cache keys and the artifact naming scheme

use std::fmt;
use std::path::{Component, Path};

use crate::errors::ResolveError;

/// Identifies one thumbnail: target bounds plus the source filename.
///
/// Realised on disk as `{width}x{height}-{filename}` in the cache directory,
/// so two sizes of the same source never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    width: u32,
    height: u32,
    filename: String,
}

impl CacheKey {
    /// Build a key, rejecting filenames that would escape the cache directory
    pub fn new(width: u32, height: u32, filename: &str) -> Result<Self, ResolveError> {
        validate_filename(filename)?;
        Ok(Self {
            width,
            height,
            filename: filename.to_string(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// File name of the artifact inside the cache directory
    pub fn artifact_name(&self) -> String {
        format!("{}x{}-{}", self.width, self.height, self.filename)
    }

    /// Recover a key from an artifact file name
    pub fn from_artifact_name(name: &str) -> Option<Self> {
        let (dimensions, filename) = name.split_once('-')?;
        let (width, height) = dimensions.split_once('x')?;
        Self::new(width.parse().ok()?, height.parse().ok()?, filename).ok()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.artifact_name())
    }
}

/// A filename is safe when it is exactly one plain path component.
///
/// Separators of either platform, `.`/`..`, NUL bytes and the empty string
/// are all refused.
pub fn validate_filename(filename: &str) -> Result<(), ResolveError> {
    let unsafe_name = || ResolveError::UnsafeFilename {
        filename: filename.to_string(),
    };

    if filename.is_empty() || filename.contains(['/', '\\', '\0']) {
        return Err(unsafe_name());
    }

    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(unsafe_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_name() {
        let key = CacheKey::new(200, 150, "sunset.jpg").unwrap();
        assert_eq!(key.artifact_name(), "200x150-sunset.jpg");
        assert_eq!(key.to_string(), "200x150-sunset.jpg");
    }

    #[test]
    fn test_distinct_sizes_are_distinct_keys() {
        let small = CacheKey::new(100, 100, "a.jpg").unwrap();
        let large = CacheKey::new(200, 200, "a.jpg").unwrap();
        assert_ne!(small, large);
        assert_ne!(small.artifact_name(), large.artifact_name());
    }

    #[test]
    fn test_from_artifact_name() {
        let key = CacheKey::from_artifact_name("320x240-my-holiday.png").unwrap();
        assert_eq!((key.width(), key.height()), (320, 240));
        assert_eq!(key.filename(), "my-holiday.png");

        assert!(CacheKey::from_artifact_name("sunset.jpg").is_none());
        assert!(CacheKey::from_artifact_name("axb-sunset.jpg").is_none());
        assert!(CacheKey::from_artifact_name("10x10-").is_none());
    }

    #[test]
    fn test_unsafe_filenames_rejected() {
        for name in ["", ".", "..", "../etc/passwd", "a/b.jpg", "a\\b.jpg", "nul\0.jpg", "/abs.jpg"] {
            assert!(
                matches!(
                    validate_filename(name),
                    Err(ResolveError::UnsafeFilename { .. })
                ),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_plain_filenames_accepted() {
        for name in ["a.jpg", "..hidden.png", "with space.gif", "ünïcode.webp"] {
            assert!(validate_filename(name).is_ok(), "{name:?} should be accepted");
        }
    }
}
