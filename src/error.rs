use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Failures a prediction request can surface to the caller. Every variant
/// renders as a JSON body `{"detail": "..."}` so clients have one error
/// shape to parse.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The model artifact failed to load at startup; every prediction
    /// fails fast with this until the process restarts with a valid file.
    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Invalid image file: {0}")]
    InvalidImage(String),

    #[error("Invalid upload: {0}")]
    BadUpload(String),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidImage(_) | ApiError::BadUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(msg) = self {
            log::error!("internal error: {}", msg);
        }
        HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ApiError::ModelUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::InvalidImage("truncated".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::BadUpload("no file field".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn body_carries_a_detail_field() {
        let resp = ApiError::ModelUnavailable.error_response();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Model not loaded");
    }
}
