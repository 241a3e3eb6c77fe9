// src/error.rs
//! Error types shared by the providers and the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde_json::json;

/// Failure reported by an external data provider (news or trends).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// Non-success HTTP status other than 429.
    #[error("provider answered HTTP {status}")]
    Unavailable { status: u16 },

    #[error("provider returned {status}: {message}")]
    Api { status: String, message: String },

    #[error("missing api key")]
    MissingApiKey,
}

impl ProviderError {
    /// Rate limiting, HTTP failures and broken payloads are the provider-error
    /// class worth retrying; everything else is treated as unexpected.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited
                | ProviderError::Unavailable { .. }
                | ProviderError::Malformed(_)
        )
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Malformed(e.to_string())
    }
}

/// Error surfaced to HTTP callers. Always rendered as a JSON envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid parameter: {param}")]
    Validation { param: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(param: impl Into<String>) -> Self {
        ApiError::Validation {
            param: param.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation { param } => {
                counter!("api_validation_errors_total").increment(1);
                let body = json!({
                    "status": "error",
                    "message": format!("Invalid parameter: {param}"),
                });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::Internal(e) => {
                tracing::error!(error = ?e, "unhandled api error");
                internal_error_response(format!("{e:#}"))
            }
        }
    }
}

/// Generic 500 envelope; also used by the panic guard.
pub fn internal_error_response(details: String) -> Response {
    let body = json!({
        "status": "error",
        "message": "Internal server error",
        "code": 500,
        "details": details,
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_class_is_rate_limit_and_malformed() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::Malformed("x".into()).is_retryable());
        assert!(ProviderError::Unavailable { status: 503 }.is_retryable());
        assert!(!ProviderError::MissingApiKey.is_retryable());
        assert!(!ProviderError::Api {
            status: "error".into(),
            message: "boom".into()
        }
        .is_retryable());
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_maps_to_400() {
        let resp = ApiError::validation("days").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({"status": "error", "message": "Invalid parameter: days"})
        );
    }

    #[tokio::test]
    async fn internal_maps_to_500_envelope() {
        let err = anyhow::anyhow!("kaput").context("building trend chart");
        let resp = ApiError::Internal(err).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(resp).await,
            json!({
                "status": "error",
                "message": "Internal server error",
                "code": 500,
                "details": "building trend chart: kaput",
            })
        );
    }
}
