use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::ConfigError;
use crate::thumbnail::{Quality, ThumbnailSpec};

pub mod defaults;
pub mod raw;

use defaults::*;
use raw::RawConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub basic_settings: BasicSettings,
    pub advanced_settings: AdvancedSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Served under `/public`
    pub public_dir: PathBuf,
    /// Source images, listed non-recursively
    pub gallery_dir: PathBuf,
    /// Thumbnail artifacts
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasicSettings {
    /// `Cache-Control` max-age in seconds for `/public`; 0 disables the header
    pub cache_expiration: u64,
    pub enable_pagination: bool,
    /// Pagination only kicks in above this many images
    pub paginator_threshold: usize,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// Already clamped into `[0, 100]`
    pub thumbnail_quality: u8,
    pub theme_name: Theme,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvancedSettings {
    pub images_per_page: usize,
    pub images_sort_by: SortKey,
    pub reverse_sort: bool,
    pub enable_debugging: bool,
}

/// Compiled page themes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Minimal,
}

impl Theme {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" | "" => Some(Self::Default),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Minimal => "minimal",
        }
    }
}

/// Listing order for the gallery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Modified,
    Size,
}

impl SortKey {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "name" | "" => Some(Self::Name),
            "modified" | "date" | "mtime" => Some(Self::Modified),
            "size" => Some(Self::Size),
            _ => None,
        }
    }
}

/// A value that was malformed and replaced by a safe default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub message: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' {}", self.key, self.message)
    }
}

/// A validated config together with everything that had to be corrected
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
    /// The file did not exist and was written with the defaults
    pub created_default: bool,
}

impl LoadedConfig {
    /// Logging is initialised after loading, so everything is reported here
    pub fn log_warnings(&self, origin: &str) {
        if self.created_default {
            info!("Created default config file: {}", origin);
        }
        for warning in &self.warnings {
            warn!("Configuration: {}", warning);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let public_dir = PathBuf::from(DEFAULT_PUBLIC_DIR);
        Self {
            server: ServerConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            storage: StorageConfig {
                gallery_dir: public_dir.join(GALLERY_SUBDIR),
                cache_dir: public_dir.join(CACHE_SUBDIR),
                public_dir,
            },
            basic_settings: BasicSettings {
                cache_expiration: DEFAULT_CACHE_EXPIRATION,
                enable_pagination: DEFAULT_ENABLE_PAGINATION,
                paginator_threshold: DEFAULT_PAGINATOR_THRESHOLD,
                thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
                thumbnail_height: DEFAULT_THUMBNAIL_HEIGHT,
                thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY,
                theme_name: Theme::default(),
            },
            advanced_settings: AdvancedSettings {
                images_per_page: DEFAULT_IMAGES_PER_PAGE,
                images_sort_by: SortKey::default(),
                reverse_sort: DEFAULT_REVERSE_SORT,
                enable_debugging: DEFAULT_ENABLE_DEBUGGING,
            },
        }
    }
}

impl Config {
    /// Load from `config_file`, layering `UBERGALLERY_*` environment variables
    /// on top. A missing file is created with the defaults first.
    pub fn load_from_file(config_file: &str) -> Result<LoadedConfig, ConfigError> {
        let created_default = !Path::new(config_file).exists();
        if created_default {
            let contents = toml::to_string_pretty(&Self::default())?;
            std::fs::write(config_file, contents).map_err(|source| ConfigError::WriteDefault {
                path: config_file.to_string(),
                source,
            })?;
        }

        let figment = Figment::new()
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        let mut loaded = Self::from_figment(figment, config_file)?;
        loaded.created_default = created_default;
        Ok(loaded)
    }

    /// Parse an in-memory TOML document without environment overrides
    pub fn from_toml_str(contents: &str) -> Result<LoadedConfig, ConfigError> {
        Self::from_figment(Figment::from(Toml::string(contents)), "<inline>")
    }

    fn from_figment(figment: Figment, origin: &str) -> Result<LoadedConfig, ConfigError> {
        let raw: RawConfig = figment.extract().map_err(|e| ConfigError::Load {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        let (config, warnings) = raw.validate();
        Ok(LoadedConfig {
            config,
            warnings,
            created_default: false,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = format!("{}:{}", self.server.host, self.server.port);
        address
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::ListenAddress {
                message: e.to_string(),
                address,
            })
    }

    /// Thumbnail bounds and quality handed to the cache at construction
    pub fn thumbnail_spec(&self) -> ThumbnailSpec {
        ThumbnailSpec::new(
            self.basic_settings.thumbnail_width,
            self.basic_settings.thumbnail_height,
            Quality::new(self.basic_settings.thumbnail_quality),
        )
    }
}
