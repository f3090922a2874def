//! Layer symbology endpoints
//!
//! - `GET    /api/layers/:id/symbology`
//! - `POST   /api/layers/:id/symbology` (candidate JSON, normalized then saved)
//! - `DELETE /api/layers/:id/symbology`
//! - `POST   /api/layers/:id/symbology/import` (raw style document body)

use crate::db::{get_layer, LayerRecord};
use crate::style_import::{import_style, SourceHint};
use crate::symbology::{normalize_description, normalize_payload, StyleDescription, SymbologyRecord};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// GET /api/layers/:id/symbology
pub async fn get_symbology(
    State(state): State<AppState>,
    Path(layer_id): Path<i64>,
) -> ApiResult<Json<SymbologyRecord>> {
    state
        .store
        .load(layer_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No symbology saved for layer {}", layer_id)))
}

/// POST /api/layers/:id/symbology
///
/// **Request:** candidate style, e.g. `{"type": "categorized", "field": "zone", "categories": [...]}`
/// **Response:** the normalized, persisted record
pub async fn save_symbology(
    State(state): State<AppState>,
    Path(layer_id): Path<i64>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<SymbologyRecord>> {
    let layer = require_layer(&state, layer_id).await?;
    let record = normalize_payload(&payload)?;
    let saved = persist(&state, &layer, record).await?;
    Ok(Json(saved))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// DELETE /api/layers/:id/symbology
pub async fn delete_symbology(
    State(state): State<AppState>,
    Path(layer_id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = state.store.delete(layer_id).await?;
    if deleted {
        info!(layer_id, "Deleted layer symbology");
    }
    Ok(Json(DeleteResponse { deleted }))
}

/// Query of an import request
#[derive(Debug, Default, Deserialize)]
pub struct ImportQuery {
    /// Uploaded file name; its extension selects the document family
    pub filename: Option<String>,
    /// Explicit document family (`qml`, `lyr`, `generic_xml`); wins over
    /// `filename`
    pub format: Option<String>,
    /// Normalize and persist the imported style
    #[serde(default)]
    pub save: bool,
    /// Target field when the document does not name one
    pub field: Option<String>,
}

impl ImportQuery {
    fn source_hint(&self) -> ApiResult<SourceHint> {
        let hint = match (&self.format, &self.filename) {
            (Some(format), _) => SourceHint::from_format(format),
            (None, Some(filename)) => SourceHint::from_filename(filename),
            (None, None) => {
                return Err(ApiError::BadRequest(
                    "filename or format query parameter is required".to_string(),
                ))
            }
        };
        hint.ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Unsupported format: {}",
                self.format.as_deref().or(self.filename.as_deref()).unwrap_or_default()
            ))
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub style: StyleDescription,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<SymbologyRecord>,
}

/// POST /api/layers/:id/symbology/import?filename=parcels.qml[&save=true]
///
/// The body is the raw style document. Without `save` the extracted style is
/// only returned; with `save=true` it is normalized and persisted as well.
pub async fn import_symbology(
    State(state): State<AppState>,
    Path(layer_id): Path<i64>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> ApiResult<Json<ImportResponse>> {
    let limit = state.settings.max_import_bytes;
    if body.len() > limit {
        return Err(ApiError::PayloadTooLarge(format!(
            "style document is {} bytes, limit is {}",
            body.len(),
            limit
        )));
    }

    let hint = query.source_hint()?;
    let style = import_style(&body, hint)?.with_default_field(query.field.clone());

    info!(
        layer_id,
        ?hint,
        style_type = style.style_type(),
        "Imported style document"
    );

    let record = if query.save {
        let layer = require_layer(&state, layer_id).await?;
        let record = normalize_description(style.clone())?;
        Some(persist(&state, &layer, record).await?)
    } else {
        None
    };

    Ok(Json(ImportResponse {
        success: true,
        style,
        record,
    }))
}

async fn require_layer(state: &AppState, layer_id: i64) -> ApiResult<LayerRecord> {
    get_layer(&state.db, layer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Layer not found: {}", layer_id)))
}

/// Save with the layer's geometry type filled in when the style has none
async fn persist(state: &AppState, layer: &LayerRecord, mut record: SymbologyRecord) -> ApiResult<SymbologyRecord> {
    if record.geometry_type.is_none() {
        record.geometry_type = layer.layer_type.clone();
    }
    let saved = state.store.save(layer.id, &record).await?;
    info!(layer_id = layer.id, style_type = saved.style_type(), "Saved layer symbology");
    Ok(saved)
}

/// Build symbology routes
pub fn symbology_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/layers/:id/symbology",
            get(get_symbology).post(save_symbology).delete(delete_symbology),
        )
        .route("/api/layers/:id/symbology/import", post(import_symbology))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_wins_over_filename() {
        let query = ImportQuery {
            filename: Some("style.qml".into()),
            format: Some("lyr".into()),
            ..Default::default()
        };
        assert_eq!(query.source_hint().unwrap(), SourceHint::Lyr);
    }

    #[test]
    fn test_unsupported_or_missing_format() {
        let query = ImportQuery {
            filename: Some("style.sld".into()),
            ..Default::default()
        };
        assert!(matches!(query.source_hint(), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            ImportQuery::default().source_hint(),
            Err(ApiError::BadRequest(_))
        ));
    }
}
