//! wgis-sym library interface
//!
//! Symbology service for WebGIS layers: classification of attribute
//! columns, import of desktop GIS style documents, and validation and
//! persistence of layer symbology.

pub mod api;
pub mod classifier;
pub mod db;
pub mod error;
pub mod features;
pub mod style_import;
pub mod symbology;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use db::{SqliteSymbologyStore, SymbologyStore};
use features::{FeatureSource, GeoJsonFeatureSource};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use wgis_common::config::TomlConfig;

/// Request limits applied by handlers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceSettings {
    /// Time box for one Feature Source read
    pub feature_read_timeout: Duration,
    /// Largest accepted style document
    pub max_import_bytes: usize,
}

impl ServiceSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            feature_read_timeout: Duration::from_secs(config.feature_read_timeout_secs),
            max_import_bytes: config.max_import_bytes,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Attribute records of layers
    pub features: Arc<dyn FeatureSource>,
    /// Persisted symbology records
    pub store: Arc<dyn SymbologyStore>,
    pub settings: ServiceSettings,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// State backed by GeoJSON files in `data_dir` and the SQLite store
    pub fn new(db: SqlitePool, data_dir: PathBuf, settings: ServiceSettings) -> Self {
        Self {
            features: Arc::new(GeoJsonFeatureSource::new(db.clone(), data_dir)),
            store: Arc::new(SqliteSymbologyStore::new(db.clone())),
            db,
            settings,
            startup_time: Utc::now(),
        }
    }

    /// Swap the Feature Source (alternate backends, tests)
    pub fn with_feature_source(mut self, features: Arc<dyn FeatureSource>) -> Self {
        self.features = features;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    // Leave headroom above the import limit so the handler can answer 413
    // with the service's own error body
    let body_limit = state.settings.max_import_bytes.saturating_mul(2).max(64 * 1024);

    Router::new()
        .merge(api::health_routes())
        .merge(api::layer_routes())
        .merge(api::symbology_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
