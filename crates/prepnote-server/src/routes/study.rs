use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use prepnote::{Script, ScriptRequest, Summary, SummaryRequest};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summaries", post(create_summary))
        .route("/scripts", post(create_script))
}

async fn create_summary(
    State(state): State<AppState>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<Summary>, ApiError> {
    let Json(request) = payload?;
    let summary = state.study()?.generate_summary(&request).await?;

    tracing::info!(
        summary_id = %summary.summary_id,
        outline_items = summary.outline.len(),
        "Generated summary"
    );

    Ok(Json(summary))
}

async fn create_script(
    State(state): State<AppState>,
    payload: Result<Json<ScriptRequest>, JsonRejection>,
) -> Result<Json<Script>, ApiError> {
    let Json(request) = payload?;
    let script = state.study()?.generate_script(&request).await?;

    tracing::info!(
        script_id = %script.script_id,
        lines = script.content.len(),
        "Generated script"
    );

    Ok(Json(script))
}
