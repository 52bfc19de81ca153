use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use prepnote::{ProcessError, StudyError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Study(#[from] StudyError),

    #[error("Summaries and scripts are unavailable: {0}")]
    StudyUnavailable(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Failed to read upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Invalid request body: {0}")]
    Json(#[from] JsonRejection),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Process(e) if e.is_dependency_failure() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Process(_) => StatusCode::BAD_REQUEST,
            ApiError::Study(StudyError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Study(StudyError::MissingApiKey(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Study(_) => StatusCode::BAD_GATEWAY,
            ApiError::StudyUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Json(e) => e.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "{}", self);
        }

        let body = Json(ErrorResponse {
            detail: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prepnote::processor::DocumentFormat;

    #[test]
    fn test_content_errors_are_bad_requests() {
        let errors = [
            ProcessError::EmptyInput("uploaded file is empty"),
            ProcessError::InsufficientText {
                format: DocumentFormat::Pdf,
            },
            ProcessError::UnsupportedFormat {
                filename: "data.xyz".to_string(),
                content_type: "application/octet-stream".to_string(),
            },
        ];

        for error in errors {
            assert_eq!(ApiError::from(error).status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_missing_dependency_is_unavailable() {
        let error = ApiError::from(ProcessError::OcrDependencyMissing("pdftoppm".to_string()));
        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_upstream_failure_is_bad_gateway() {
        let error = ApiError::from(StudyError::Api {
            status: 429,
            body: "rate limited".to_string(),
        });
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    }
}
