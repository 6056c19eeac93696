//! # reelmatch common library
//!
//! Shared code for the reelmatch ingestion and lookup binaries:
//! - Error type shared by both pipelines
//! - Configuration loading (TOML file, environment, defaults)
//! - SQLite pool setup and the local `titles` catalog

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
