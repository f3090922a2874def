//! HTTP error type for wgis-sym
//!
//! Every domain error converts into [`ApiError`]; the response body is
//! `{"success": false, "error": {"code", "message"}}`.

use crate::classifier::ClassifyError;
use crate::features::FeatureSourceError;
use crate::style_import::ImportError;
use crate::symbology::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Import body above the configured limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Feature read exceeded its time box (504)
    #[error("Timed out: {0}")]
    Timeout(String),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    FeatureSource(#[from] FeatureSourceError),

    /// wgis-common error
    #[error("Common error: {0}")]
    Common(#[from] wgis_common::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ApiError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            ApiError::Classify(e) => (
                StatusCode::BAD_REQUEST,
                match e {
                    ClassifyError::InvalidField(_) => "INVALID_FIELD",
                    ClassifyError::InvalidBreaks(_) => "INVALID_BREAKS",
                    ClassifyError::InvalidClassCount(_) => "INVALID_CLASSES",
                    ClassifyError::EmptySeries(_) => "EMPTY_SERIES",
                },
            ),
            ApiError::Import(e) => (
                StatusCode::BAD_REQUEST,
                match e {
                    ImportError::MalformedDocument(_) => "MALFORMED_DOCUMENT",
                    ImportError::RendererNotFound => "RENDERER_NOT_FOUND",
                    ImportError::UnsupportedRendererType(_) => "UNSUPPORTED_RENDERER_TYPE",
                    ImportError::UnsupportedContainer(_) => "UNSUPPORTED_CONTAINER",
                    ImportError::UnrecognizedDialect => "UNRECOGNIZED_DIALECT",
                },
            ),
            ApiError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                match e {
                    ValidationError::MissingField(_) => "MISSING_FIELD",
                    ValidationError::UnsupportedStyleType(_) => "UNSUPPORTED_STYLE_TYPE",
                    ValidationError::InvalidPayload(_) => "INVALID_PAYLOAD",
                },
            ),
            ApiError::FeatureSource(FeatureSourceError::LayerNotFound(_)) => {
                (StatusCode::NOT_FOUND, "LAYER_NOT_FOUND")
            }
            ApiError::FeatureSource(FeatureSourceError::LayerDataUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "LAYER_DATA_UNAVAILABLE")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, "{}", self);
        } else {
            tracing::debug!(code, "{}", self);
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(ClassifyError::EmptySeries("v".into())), StatusCode::BAD_REQUEST),
            (ApiError::from(ImportError::RendererNotFound), StatusCode::BAD_REQUEST),
            (
                ApiError::from(ClassifyError::InvalidClassCount(5000)),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(ValidationError::MissingField("field".into())),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::from(FeatureSourceError::LayerNotFound(3)), StatusCode::NOT_FOUND),
            (
                ApiError::from(FeatureSourceError::LayerDataUnavailable("gone".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ApiError::Timeout("read".into()), StatusCode::GATEWAY_TIMEOUT),
            (ApiError::PayloadTooLarge("big".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (
                ApiError::from(wgis_common::Error::Internal("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
