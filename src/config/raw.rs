//! Loosely typed view of the config file
//!
//! The file is edited by hand, so every value is accepted in whatever shape it
//! arrives (number, string, bool) and converted exactly once by
//! [`RawConfig::validate`]. Values that do not convert become
//! [`ConfigWarning`]s and fall back to a safe default; nothing here aborts
//! startup.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;

use serde::Deserialize;
use serde::de::IgnoredAny;

use super::defaults::*;
use super::{
    AdvancedSettings, BasicSettings, Config, ConfigWarning, ServerConfig, SortKey, StorageConfig,
    Theme,
};

/// A single config value before validation
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Setting {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Setting {
    fn describe(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Text(s) => format!("{s:?}"),
        }
    }
}

type UnknownKeys = BTreeMap<String, IgnoredAny>;

#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub server: RawServer,
    #[serde(default)]
    pub storage: RawStorage,
    #[serde(default)]
    pub basic_settings: RawBasicSettings,
    #[serde(default)]
    pub advanced_settings: RawAdvancedSettings,
    #[serde(flatten)]
    pub unknown: UnknownKeys,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawServer {
    pub host: Option<Setting>,
    pub port: Option<Setting>,
    #[serde(flatten)]
    pub unknown: UnknownKeys,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawStorage {
    pub public_dir: Option<Setting>,
    pub gallery_dir: Option<Setting>,
    pub cache_dir: Option<Setting>,
    #[serde(flatten)]
    pub unknown: UnknownKeys,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawBasicSettings {
    pub cache_expiration: Option<Setting>,
    pub enable_pagination: Option<Setting>,
    pub paginator_threshold: Option<Setting>,
    pub thumbnail_width: Option<Setting>,
    pub thumbnail_height: Option<Setting>,
    pub thumbnail_quality: Option<Setting>,
    pub theme_name: Option<Setting>,
    #[serde(flatten)]
    pub unknown: UnknownKeys,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawAdvancedSettings {
    pub images_per_page: Option<Setting>,
    pub images_sort_by: Option<Setting>,
    pub reverse_sort: Option<Setting>,
    pub enable_debugging: Option<Setting>,
    #[serde(flatten)]
    pub unknown: UnknownKeys,
}

impl RawConfig {
    /// Convert into a typed [`Config`], collecting every warning on the way
    pub fn validate(self) -> (Config, Vec<ConfigWarning>) {
        let mut v = Validator::default();

        for section in self.unknown.keys() {
            v.warn(section, "unsupported section");
        }

        let server = ServerConfig {
            host: v.text("server", "host", self.server.host, DEFAULT_HOST),
            port: v.unsigned("server", "port", self.server.port, DEFAULT_PORT),
        };
        v.unknown_keys("server", &self.server.unknown);

        let public_dir = v
            .path("storage", "public_dir", self.storage.public_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR));
        let gallery_dir = v
            .path("storage", "gallery_dir", self.storage.gallery_dir)
            .unwrap_or_else(|| public_dir.join(GALLERY_SUBDIR));
        let cache_dir = v
            .path("storage", "cache_dir", self.storage.cache_dir)
            .unwrap_or_else(|| public_dir.join(CACHE_SUBDIR));
        v.unknown_keys("storage", &self.storage.unknown);

        let basic = self.basic_settings;
        let theme_name = v.text("basic_settings", "theme_name", basic.theme_name, "default");
        let basic_settings = BasicSettings {
            cache_expiration: v.unsigned(
                "basic_settings",
                "cache_expiration",
                basic.cache_expiration,
                DEFAULT_CACHE_EXPIRATION,
            ),
            enable_pagination: v.boolean(
                "basic_settings",
                "enable_pagination",
                basic.enable_pagination,
                DEFAULT_ENABLE_PAGINATION,
            ),
            paginator_threshold: v.unsigned(
                "basic_settings",
                "paginator_threshold",
                basic.paginator_threshold,
                DEFAULT_PAGINATOR_THRESHOLD,
            ),
            thumbnail_width: v.unsigned(
                "basic_settings",
                "thumbnail_width",
                basic.thumbnail_width,
                DEFAULT_THUMBNAIL_WIDTH,
            ),
            thumbnail_height: v.unsigned(
                "basic_settings",
                "thumbnail_height",
                basic.thumbnail_height,
                DEFAULT_THUMBNAIL_HEIGHT,
            ),
            thumbnail_quality: v.quality(basic.thumbnail_quality),
            theme_name: Theme::from_name(&theme_name).unwrap_or_else(|| {
                v.warn(
                    "basic_settings.theme_name",
                    format!("unknown theme {theme_name:?}; using \"default\""),
                );
                Theme::default()
            }),
        };
        v.unknown_keys("basic_settings", &basic.unknown);

        let advanced = self.advanced_settings;
        let sort_by = v.text("advanced_settings", "images_sort_by", advanced.images_sort_by, "name");
        let advanced_settings = AdvancedSettings {
            images_per_page: v.unsigned(
                "advanced_settings",
                "images_per_page",
                advanced.images_per_page,
                DEFAULT_IMAGES_PER_PAGE,
            ),
            images_sort_by: SortKey::from_name(&sort_by).unwrap_or_else(|| {
                v.warn(
                    "advanced_settings.images_sort_by",
                    format!("unknown sort key {sort_by:?}; using \"name\""),
                );
                SortKey::default()
            }),
            reverse_sort: v.boolean(
                "advanced_settings",
                "reverse_sort",
                advanced.reverse_sort,
                DEFAULT_REVERSE_SORT,
            ),
            enable_debugging: v.boolean(
                "advanced_settings",
                "enable_debugging",
                advanced.enable_debugging,
                DEFAULT_ENABLE_DEBUGGING,
            ),
        };
        v.unknown_keys("advanced_settings", &advanced.unknown);

        let config = Config {
            server,
            storage: StorageConfig {
                public_dir,
                gallery_dir,
                cache_dir,
            },
            basic_settings,
            advanced_settings,
        };

        (config, v.warnings)
    }
}

#[derive(Default)]
struct Validator {
    warnings: Vec<ConfigWarning>,
}

impl Validator {
    fn warn(&mut self, key: &str, message: impl Into<String>) {
        self.warnings.push(ConfigWarning {
            key: key.to_string(),
            message: message.into(),
        });
    }

    fn unknown_keys(&mut self, section: &str, keys: &UnknownKeys) {
        for key in keys.keys() {
            self.warn(&format!("{section}.{key}"), "unsupported key");
        }
    }

    /// Malformed integers become 0
    fn integer(&mut self, key: &str, value: Option<Setting>) -> Option<i64> {
        match value? {
            Setting::Int(i) => Some(i),
            Setting::Text(s) => match s.trim().parse::<i64>() {
                Ok(i) => Some(i),
                Err(e) => {
                    self.warn(key, format!("unable to parse integer from {s:?} ({e}); set to 0"));
                    Some(0)
                }
            },
            other => {
                self.warn(
                    key,
                    format!("expected an integer, got {}; set to 0", other.describe()),
                );
                Some(0)
            }
        }
    }

    fn unsigned<T>(&mut self, section: &str, name: &str, value: Option<Setting>, default: T) -> T
    where
        T: TryFrom<i64> + Default + Display + Copy,
    {
        let key = format!("{section}.{name}");
        match self.integer(&key, value) {
            None => default,
            Some(i) if i < 0 => {
                self.warn(&key, "must be >= 0; set to 0");
                T::default()
            }
            Some(i) => T::try_from(i).unwrap_or_else(|_| {
                self.warn(&key, format!("{i} is out of range; using {default}"));
                default
            }),
        }
    }

    fn quality(&mut self, value: Option<Setting>) -> u8 {
        let key = "basic_settings.thumbnail_quality";
        match self.integer(key, value) {
            None => DEFAULT_THUMBNAIL_QUALITY,
            Some(i) if i < 0 => {
                self.warn(key, "must be >= 0; set to 0");
                0
            }
            Some(i) if i > MAX_THUMBNAIL_QUALITY => {
                self.warn(key, "must be <= 100; set to 100");
                100
            }
            Some(i) => i as u8,
        }
    }

    /// Anything other than `true` reads as false; values that are neither
    /// `true` nor `false` are reported
    fn boolean(&mut self, section: &str, name: &str, value: Option<Setting>, default: bool) -> bool {
        let key = format!("{section}.{name}");
        match value {
            None => default,
            Some(Setting::Bool(b)) => b,
            Some(Setting::Text(s)) => match s.trim() {
                "true" => true,
                "false" => false,
                other => {
                    self.warn(&key, format!("expected true or false, got {other:?}; set to false"));
                    false
                }
            },
            Some(other) => {
                self.warn(
                    &key,
                    format!("expected true or false, got {}; set to false", other.describe()),
                );
                false
            }
        }
    }

    fn text(&mut self, section: &str, name: &str, value: Option<Setting>, default: &str) -> String {
        match value {
            None => default.to_string(),
            Some(Setting::Text(s)) => s,
            Some(other) => {
                self.warn(
                    &format!("{section}.{name}"),
                    format!("expected a string, got {}; using {default:?}", other.describe()),
                );
                default.to_string()
            }
        }
    }

    fn path(&mut self, section: &str, name: &str, value: Option<Setting>) -> Option<PathBuf> {
        match value? {
            Setting::Text(s) if !s.trim().is_empty() => Some(PathBuf::from(s)),
            other => {
                self.warn(
                    &format!("{section}.{name}"),
                    format!("expected a directory path, got {}; using default", other.describe()),
                );
                None
            }
        }
    }
}
