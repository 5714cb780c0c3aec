//! Error types for the dashboard API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::flow::FlowError;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Invalid parameter in request
    InvalidParameter(String),
    /// Flow aggregation failed
    ComputationFailed(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            ApiError::ComputationFailed(msg) => write!(f, "Computation failed: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::InvalidParameter(msg) => {
                (StatusCode::BAD_REQUEST, "InvalidParameter", msg.clone())
            }
            ApiError::ComputationFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ComputationFailed",
                msg.clone(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = error_type, "{}", message);
        }

        let body = Json(json!({
            "error": error_type,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::InvalidInput(msg) => ApiError::InvalidParameter(msg),
            FlowError::MissingColumn(_) => ApiError::ComputationFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_errors_map_to_status() {
        let invalid: ApiError = FlowError::InvalidInput("one stage".to_string()).into();
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let missing: ApiError = FlowError::MissingColumn("Points".to_string()).into();
        assert_eq!(
            missing.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_names_variant() {
        let response = ApiError::InvalidParameter("width must be between 250 and 2000".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "InvalidParameter");
        assert_eq!(body["message"], "width must be between 250 and 2000");
    }

    #[test]
    fn test_display_prefixes() {
        let err: ApiError = FlowError::MissingColumn("Points".to_string()).into();
        assert_eq!(err.to_string(), "Computation failed: Missing column: Points");
        assert_eq!(
            ApiError::InvalidParameter("team".to_string()).to_string(),
            "Invalid parameter: team"
        );
    }
}
