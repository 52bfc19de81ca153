use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use prepnote::sanitize::redact_filename;

use crate::error::ApiError;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ExtractTextResponse {
    pub text: String,
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/extract-text", post(extract_text))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Extract text from the uploaded `file` field.
async fn extract_text(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractTextResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().trim().to_string();
        let content_type = field
            .content_type()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let data = field.bytes().await?;

        tracing::info!(
            file = %redact_filename(&filename),
            content_type = %content_type,
            bytes = data.len(),
            "Received upload"
        );

        // Parsing and OCR are CPU bound.
        let extractor = state.extractor();
        let result = tokio::task::spawn_blocking(move || {
            extractor.extract_text(&filename, &content_type, &data)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("extraction task failed: {}", e)))??;

        tracing::info!(format = %result.format, chars = result.text.chars().count(), "Extracted text");

        return Ok(Json(ExtractTextResponse { text: result.text }));
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}
