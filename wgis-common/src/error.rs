//! Error type shared by the WGIS crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the shared layers: storage, filesystem and bootstrap config
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable or not valid TOML
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored document no longer (de)serializes
    #[error("Internal error: {0}")]
    Internal(String),
}
