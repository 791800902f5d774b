//! Handlers for the dataset download endpoints.
//!
//! Each artifact is assembled fully in memory on a blocking task, so a
//! large export cannot stall unrelated requests on the async runtime.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use champi_core::report;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const ZIP_CONTENT_TYPE: &str = "application/zip";
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Run one of the in-memory artifact builders on the blocking pool.
async fn build_artifact<F>(state: &AppState, build: F) -> AppResult<Vec<u8>>
where
    F: FnOnce(&std::path::Path) -> Result<Vec<u8>, champi_core::CoreError> + Send + 'static,
{
    let root = state.store.root().to_path_buf();
    tokio::task::spawn_blocking(move || build(&root))
        .await
        .map_err(|e| AppError::InternalError(format!("export task failed: {e}")))?
        .map_err(AppError::from)
}

/// Attachment response headers for a download.
fn attachment(content_type: &'static str, filename: &str) -> [(header::HeaderName, String); 2] {
    [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ]
}

/// GET /download/dataset
///
/// The whole dataset tree, unprocessed, for advanced consumers.
pub async fn download_dataset(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    tracing::info!("Raw dataset bundle requested");
    let bytes = build_artifact(&state, |root| report::build_raw_bundle(root)).await?;
    Ok((
        attachment(ZIP_CONTENT_TYPE, report::RAW_BUNDLE_FILENAME),
        bytes,
    ))
}

/// GET /download/dataset/report
///
/// Spreadsheet plus the images directory, for basic consumers.
pub async fn download_report(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    tracing::info!("Report bundle requested");
    let bytes = build_artifact(&state, |root| report::build_report_bundle(root)).await?;
    Ok((
        attachment(ZIP_CONTENT_TYPE, report::REPORT_BUNDLE_FILENAME),
        bytes,
    ))
}

/// GET /download/dataset/excel
///
/// The flattened-dataset spreadsheet alone.
pub async fn download_spreadsheet(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    tracing::info!("Spreadsheet download requested");
    let bytes = build_artifact(&state, |root| report::build_spreadsheet(root)).await?;
    Ok((
        attachment(XLSX_CONTENT_TYPE, report::SPREADSHEET_FILENAME),
        bytes,
    ))
}
