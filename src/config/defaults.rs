//! Default values for every configuration option
//!
//! These are also what gets written to a freshly created config file.

// Config file defaults
pub const DEFAULT_CONFIG_FILE: &str = "galleryConfig.toml";
pub const ENV_PREFIX: &str = "UBERGALLERY_";

// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

// Storage defaults
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const GALLERY_SUBDIR: &str = "gallery-images";
pub const CACHE_SUBDIR: &str = "cache";

// Basic settings defaults
pub const DEFAULT_CACHE_EXPIRATION: u64 = 0;
pub const DEFAULT_ENABLE_PAGINATION: bool = false;
pub const DEFAULT_PAGINATOR_THRESHOLD: usize = 0;
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 200;
pub const DEFAULT_THUMBNAIL_HEIGHT: u32 = 200;
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 75;
pub const MAX_THUMBNAIL_QUALITY: i64 = 100;

// Advanced settings defaults
pub const DEFAULT_IMAGES_PER_PAGE: usize = 20;
pub const DEFAULT_REVERSE_SORT: bool = false;
pub const DEFAULT_ENABLE_DEBUGGING: bool = false;
