//! Error type definitions for the gallery server

use std::path::PathBuf;

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem errors outside of the cache fallback path
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Listener could not be bound
    #[error("Failed to bind to {addr}: {message}")]
    Bind { addr: String, message: String },
}

/// Hard configuration failures.
///
/// Malformed individual values are not errors: they become
/// [`crate::config::ConfigWarning`]s and fall back to safe defaults.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed
    #[error("Failed to load configuration from {path}: {message}")]
    Load { path: String, message: String },

    /// The default file could not be written
    #[error("Failed to write default configuration to {path}: {source}")]
    WriteDefault {
        path: String,
        source: std::io::Error,
    },

    /// Defaults could not be serialized
    #[error("Failed to serialize default configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Host/port do not form a socket address
    #[error("Invalid listen address {address}: {message}")]
    ListenAddress { address: String, message: String },
}

/// Thumbnail generation failures. The generator is a pure transform, so the
/// only ways it can fail are on the way in and on the way out.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Source bytes are not a decodable image
    #[error("Failed to decode source image: {0}")]
    DecodeFailed(String),

    /// The resized image could not be encoded
    #[error("Failed to encode thumbnail: {0}")]
    EncodeFailed(String),

    /// The blocking generation task panicked or was aborted
    #[error("Thumbnail task failed: {0}")]
    TaskFailed(String),
}

/// Reasons a cache resolution fell back to the source path.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Filename is not a single plain path component
    #[error("Refusing unsafe filename {filename:?}")]
    UnsafeFilename { filename: String },

    /// Source file missing or unreadable
    #[error("Source image {path:?} is unreadable: {source}")]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Decode, resize or encode failed
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Artifact could not be written to the cache directory
    #[error("Failed to persist thumbnail {path:?}: {source}")]
    PersistFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Gallery directory enumeration failures. Fatal to the request, not the
/// process.
#[derive(Error, Debug)]
pub enum ListingError {
    /// Directory missing or unreadable
    #[error("Cannot read gallery directory {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ResolveError {
    /// Short machine-friendly label used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsafeFilename { .. } => "unsafe_filename",
            Self::SourceUnreadable { .. } => "source_unreadable",
            Self::Generation(GenerationError::DecodeFailed(_)) => "decode_failed",
            Self::Generation(_) => "generation_failed",
            Self::PersistFailed { .. } => "persist_failed",
        }
    }
}
