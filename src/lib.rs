pub mod config;
pub mod errors;
pub mod gallery;
pub mod thumbnail;
pub mod web;
