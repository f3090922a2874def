//! # WGIS Common Library
//!
//! Shared code for the WGIS services:
//! - Error type and result alias
//! - Configuration loading (TOML bootstrap, root folder resolution)
//! - SQLite schema initialization

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
