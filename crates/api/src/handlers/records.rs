//! Handlers for the stored-record history endpoints.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /images/
///
/// One flattened summary per stored record whose image file exists.
/// Half-written records (metadata without image, or unparseable metadata)
/// are silently skipped; an upload may be racing this scan.
pub async fn list_records(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let summaries = state.store.list_summaries().await?;
    Ok(Json(summaries))
}

/// GET /images/{id}
///
/// 404 when either the metadata file or the image file is missing.
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let summary = state.store.load_summary(&id).await?;
    Ok(Json(summary))
}
