//! Feature Source: attribute records of a layer's dataset
//!
//! Reads are I/O bound and may be slow for large datasets. This module
//! imposes no timeout and performs no retries; callers time-box the read.

pub mod attributes;
pub mod geojson;

pub use attributes::{
    AttributeSeries, AttributeTable, AttributeValue, FieldKind, FieldSummary, GEOMETRY_COLUMN,
};
pub use geojson::GeoJsonFeatureSource;

use thiserror::Error;

/// Feature Source errors
#[derive(Debug, Error)]
pub enum FeatureSourceError {
    /// No layer with this id
    #[error("Layer not found: {0}")]
    LayerNotFound(i64),

    /// The layer's dataset could not be located, opened or parsed
    #[error("Layer data unavailable: {0}")]
    LayerDataUnavailable(String),
}

/// Yields the attribute records of a layer
#[async_trait::async_trait]
pub trait FeatureSource: Send + Sync {
    /// Read every attribute record of the layer, including the reserved
    /// geometry column
    async fn read_attributes(&self, layer_id: i64) -> Result<AttributeTable, FeatureSourceError>;
}
