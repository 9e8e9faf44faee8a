//! Centralized error handling for the gallery server
//!
//! Errors are split by layer so each one carries only what its caller can act
//! on:
//!
//! - **Configuration Errors**: the config file cannot be read or parsed at all
//! - **Generation Errors**: decode/resize/encode failures inside the thumbnailer
//! - **Resolve Errors**: why a thumbnail lookup degraded to the source image
//! - **Listing Errors**: the gallery directory cannot be enumerated
//! - **Application Errors**: everything the binary may bail out on
//!
//! Only `ListingError` and `AppError` ever reach a user. Generation and resolve
//! errors are logged by the cache and replaced by the fallback path.
//!
//! # Usage
//!
//! ```rust
//! use ubergallery::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for directory listing Results
pub type ListingResult<T> = Result<T, ListingError>;
