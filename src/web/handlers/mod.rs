//! HTTP request handlers
//!
//! Handlers stay thin: they read the request, call the gallery service and
//! pick a response format.

pub mod api;
pub mod gallery;
pub mod health;
