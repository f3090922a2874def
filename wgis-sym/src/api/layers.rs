//! Layer attribute endpoints: field listing and classification
//!
//! - `GET  /api/layers/:id/fields`
//! - `POST /api/layers/:id/classify`

use crate::classifier::{
    classify_table, ClassificationMethod, ClassificationMode, ClassificationRequest,
    ClassificationResult, ClassifyError, DEFAULT_CLASS_COUNT, MAX_CLASS_COUNT,
};
use crate::features::FieldSummary;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Response of the field listing
#[derive(Debug, Serialize)]
pub struct FieldsResponse {
    pub fields: Vec<FieldSummary>,
    /// Dominant geometry type of the layer's features
    pub layer_type: Option<String>,
}

/// GET /api/layers/:id/fields
///
/// Lists every attribute column except the geometry column.
pub async fn list_fields(
    State(state): State<AppState>,
    Path(layer_id): Path<i64>,
) -> ApiResult<Json<FieldsResponse>> {
    let table = super::read_attributes(&state, layer_id).await?;

    let layer_type = match table.geometry_type() {
        Some(geometry) => Some(geometry),
        None => crate::db::get_layer(&state.db, layer_id)
            .await?
            .and_then(|layer| layer.layer_type),
    };

    Ok(Json(FieldsResponse {
        fields: table.field_summaries(),
        layer_type,
    }))
}

/// Body of a classification request
///
/// `mode` other than "categorized" means graduated; unknown methods mean
/// equal interval; a missing or zero class count means 5.
#[derive(Debug, Default, Deserialize)]
pub struct ClassifyBody {
    pub field: Option<String>,
    pub mode: Option<String>,
    pub method: Option<String>,
    /// Number or numeric string
    pub classes: Option<Value>,
    #[serde(default)]
    pub breaks: Vec<Value>,
}

impl ClassifyBody {
    /// Resolve lenient request fields into a classification request
    pub fn into_request(self) -> ApiResult<ClassificationRequest> {
        let field = self
            .field
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .ok_or_else(|| ClassifyError::InvalidField("field is required".to_string()))?;

        let request = match ClassificationMode::parse_lenient(self.mode.as_deref()) {
            ClassificationMode::Categorized => ClassificationRequest::categorized(field),
            ClassificationMode::Graduated => ClassificationRequest::graduated(
                field,
                ClassificationMethod::parse_or_default(self.method.as_deref()),
                class_count(self.classes.as_ref())?,
            ),
        };
        Ok(request.with_breaks(self.breaks))
    }
}

fn class_count(classes: Option<&Value>) -> ApiResult<usize> {
    let count = match classes {
        None | Some(Value::Null) => return Ok(DEFAULT_CLASS_COUNT),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(DEFAULT_CLASS_COUNT),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };
    match count {
        Some(0) => Ok(DEFAULT_CLASS_COUNT),
        Some(c) if c <= MAX_CLASS_COUNT as u64 => Ok(c as usize),
        Some(c) => Err(ApiError::BadRequest(format!(
            "classes must be at most {}, got {}",
            MAX_CLASS_COUNT, c
        ))),
        None => Err(ApiError::BadRequest(format!(
            "classes must be a non-negative integer, got {}",
            classes.map(Value::to_string).unwrap_or_default()
        ))),
    }
}

/// POST /api/layers/:id/classify
///
/// **Request:** `{"field": "pop", "mode": "graduated", "method": "quantiles", "classes": 5}`
/// **Response:** `{"breaks": [...]}` or `{"categories": [...]}`
///
/// A field with no finite values yields `{"breaks": []}`.
pub async fn classify_layer(
    State(state): State<AppState>,
    Path(layer_id): Path<i64>,
    Json(body): Json<ClassifyBody>,
) -> ApiResult<Json<ClassificationResult>> {
    let request = body.into_request()?;
    let table = super::read_attributes(&state, layer_id).await?;

    match classify_table(&table, &request) {
        Ok(result) => {
            info!(
                layer_id,
                field = %request.field,
                mode = ?request.mode,
                method = request.method.as_str(),
                "Classified layer field"
            );
            Ok(Json(result))
        }
        Err(ClassifyError::EmptySeries(field)) => {
            debug!(layer_id, field = %field, "No finite values: returning empty breaks");
            Ok(Json(ClassificationResult::Breaks(Vec::new())))
        }
        Err(e) => Err(e.into()),
    }
}

/// Build layer attribute routes
pub fn layer_routes() -> Router<AppState> {
    Router::new()
        .route("/api/layers/:id/fields", get(list_fields))
        .route("/api/layers/:id/classify", post(classify_layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> ClassifyBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_lenient_defaults() {
        let request = body(json!({"field": "pop", "mode": "whatever", "method": "bogus"}))
            .into_request()
            .unwrap();
        assert_eq!(request.mode, ClassificationMode::Graduated);
        assert_eq!(request.method, ClassificationMethod::Equal);
        assert_eq!(request.classes, DEFAULT_CLASS_COUNT);
    }

    #[test]
    fn test_classes_forms() {
        let request = body(json!({"field": "pop", "classes": "7"})).into_request().unwrap();
        assert_eq!(request.classes, 7);
        let request = body(json!({"field": "pop", "classes": 0})).into_request().unwrap();
        assert_eq!(request.classes, DEFAULT_CLASS_COUNT);
        assert!(body(json!({"field": "pop", "classes": "many"})).into_request().is_err());
        assert!(body(json!({"field": "pop", "classes": -2})).into_request().is_err());
    }

    #[test]
    fn test_classes_upper_bound() {
        let request = body(json!({"field": "pop", "classes": MAX_CLASS_COUNT}))
            .into_request()
            .unwrap();
        assert_eq!(request.classes, MAX_CLASS_COUNT);
        for huge in [json!(MAX_CLASS_COUNT + 1), json!(100_000_000_000u64), json!(u64::MAX)] {
            assert!(matches!(
                body(json!({"field": "pop", "classes": huge})).into_request(),
                Err(ApiError::BadRequest(_))
            ));
        }
        assert!(body(json!({"field": "pop", "classes": "18446744073709551615"}))
            .into_request()
            .is_err());
    }

    #[test]
    fn test_field_required() {
        assert!(matches!(
            body(json!({"mode": "categorized"})).into_request(),
            Err(ApiError::Classify(ClassifyError::InvalidField(_)))
        ));
    }
}
