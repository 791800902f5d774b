//! Handler for the annotated-image upload endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use champi_core::ingest;
use champi_core::types::UploadPayload;

use crate::error::AppResult;
use crate::state::AppState;

/// Response body for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub id: String,
    pub image_filename: String,
    pub label_filename: String,
    pub valid_annotations: usize,
    pub skipped_annotations: usize,
}

/// POST /upload-image/
///
/// Decodes the embedded image, normalizes the annotations into a YOLO
/// label file, and persists the image/label/metadata triple. The whole
/// request succeeds or fails as one unit from the caller's perspective.
pub async fn upload_image(
    State(state): State<AppState>,
    Json(payload): Json<UploadPayload>,
) -> AppResult<impl IntoResponse> {
    let annotation_count = payload.annotations.len();
    let receipt = ingest::ingest(&state.store, payload).await?;

    tracing::info!(
        id = %receipt.id,
        submitted = annotation_count,
        valid = receipt.valid_annotations,
        skipped = receipt.skipped_annotations,
        "Upload accepted"
    );

    let response = UploadResponse {
        message: "Imagen y anotaciones guardadas correctamente",
        id: receipt.id,
        image_filename: receipt.image_filename,
        label_filename: receipt.label_filename,
        valid_annotations: receipt.valid_annotations,
        skipped_annotations: receipt.skipped_annotations,
    };

    Ok((StatusCode::OK, Json(response)))
}
