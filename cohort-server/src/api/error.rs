use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cohort_types::ErrorResponse;

use crate::demo_store::DemoStoreError;
use crate::domain_check::DomainCheckError;
use crate::video::InvalidVideoUrl;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    TooManyRequests(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", Some(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", Some(msg)),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", Some(msg)),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg)),
            ApiError::TooManyRequests(msg) => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too Many Requests",
                Some(msg),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    Some("An unexpected error occurred".to_string()),
                )
            }
        };

        let error_response = ErrorResponse {
            error: message.to_string(),
            details,
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<InvalidVideoUrl> for ApiError {
    fn from(err: InvalidVideoUrl) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<DomainCheckError> for ApiError {
    fn from(err: DomainCheckError) -> Self {
        match err {
            DomainCheckError::InvalidDomain(_) => ApiError::BadRequest(err.to_string()),
            DomainCheckError::Client(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<DemoStoreError> for ApiError {
    fn from(err: DemoStoreError) -> Self {
        match err {
            DemoStoreError::UnknownCollection(_) => ApiError::NotFound(err.to_string()),
            DemoStoreError::InvalidItem(_) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::InternalError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_internal_details_are_masked() {
        let response = ApiError::InternalError("disk I/O error at /var/db".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "Internal Server Error");
        assert_eq!(parsed.details.as_deref(), Some("An unexpected error occurred"));
    }

    #[test]
    fn test_domain_errors_map_to_status() {
        let response = ApiError::from(InvalidVideoUrl).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::from(DemoStoreError::UnknownCollection("x".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
