//! HTTP API handlers for wgis-sym

pub mod health;
pub mod layers;
pub mod symbology;

pub use health::health_routes;
pub use layers::layer_routes;
pub use symbology::symbology_routes;

use crate::features::AttributeTable;
use crate::{ApiError, ApiResult, AppState};

/// Read a layer's attributes within the configured time box
pub(crate) async fn read_attributes(state: &AppState, layer_id: i64) -> ApiResult<AttributeTable> {
    let limit = state.settings.feature_read_timeout;
    let table = tokio::time::timeout(limit, state.features.read_attributes(layer_id))
        .await
        .map_err(|_| {
            ApiError::Timeout(format!(
                "reading layer {} exceeded {}s",
                layer_id,
                limit.as_secs_f64()
            ))
        })??;
    Ok(table)
}
