//! Client-facing error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::relay::client::ForwardError;

/// JSON error body: `{"status_code": 503, "detail": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status_code: u16,
    pub detail: String,
}

/// An error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl From<ForwardError> for ApiError {
    fn from(err: ForwardError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        let detail = match &err {
            ForwardError::InvalidRequest { .. }
            | ForwardError::Body(_)
            | ForwardError::Malformed(_) => {
                format!("unexpected error: {err}")
            }
            _ => err.to_string(),
        };
        Self { status, detail }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status_code: self.status.as_u16(),
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_passes_through() {
        let err = ApiError::from(ForwardError::Upstream {
            status: 422,
            body: "bad tensor".to_string(),
        });
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.detail.contains("422"));
        assert!(err.detail.contains("bad tensor"));
    }

    #[test]
    fn test_malformed_is_internal() {
        let err = ApiError::from(ForwardError::Malformed("missing field `outputs`".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.detail.starts_with("unexpected error"));
    }

    #[test]
    fn test_non_error_upstream_status_is_bad_gateway() {
        let err = ApiError::from(ForwardError::Upstream {
            status: 304,
            body: String::new(),
        });
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }
}
