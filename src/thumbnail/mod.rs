//! On-demand thumbnail cache
//!
//! Thumbnails are generated the first time a source image is requested and
//! stored under the cache directory as `{width}x{height}-{filename}`. Later
//! requests for the same key return the stored artifact without touching the
//! source.
//!
//! - [`generator`]: decode, fit-within-box resize, JPEG encode
//! - [`key`]: cache key derivation and filename sanitization
//! - [`cache`]: lookup, single-flight generation, atomic persistence and
//!   fallback to the source path

use tracing::warn;

pub mod cache;
pub mod generator;
pub mod key;

pub use cache::ThumbnailCache;
pub use generator::{JpegThumbnailer, ThumbnailGenerator, fit_dimensions, generate_thumbnail};
pub use key::CacheKey;

/// JPEG quality in `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;

    /// Values above 100 are clamped to 100
    pub fn new(value: u8) -> Self {
        Self::clamped(i64::from(value))
    }

    /// Clamp an arbitrary integer into range, warning when it had to move
    pub fn clamped(value: i64) -> Self {
        if value < i64::from(Self::MIN) {
            warn!("Thumbnail quality {} must be >= 0; set to 0", value);
            Self(Self::MIN)
        } else if value > i64::from(Self::MAX) {
            warn!("Thumbnail quality {} must be <= 100; set to 100", value);
            Self(Self::MAX)
        } else {
            Self(value as u8)
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(crate::config::defaults::DEFAULT_THUMBNAIL_QUALITY)
    }
}

/// Bounding box and quality for one thumbnail size.
///
/// A bound of 0 leaves that axis unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThumbnailSpec {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
}

impl ThumbnailSpec {
    pub fn new(max_width: u32, max_height: u32, quality: Quality) -> Self {
        Self {
            max_width,
            max_height,
            quality,
        }
    }
}
