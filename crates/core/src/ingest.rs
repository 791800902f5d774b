//! The ingestion normalizer.
//!
//! One upload becomes one stored record: decode the base64 raster, capture
//! its pixel dimensions, then write the image, the normalized label file,
//! and the metadata document under a freshly drawn uuid. Decode failures
//! abort before anything touches the disk; write failures surface with the
//! original cause text and leave any partial writes in place.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{GenericImageView, ImageFormat};
use uuid::Uuid;

use crate::error::CoreError;
use crate::labels::build_label_lines;
use crate::storage::DatasetStore;
use crate::types::{IngestReceipt, RecordDocument, UploadPayload};

/// Validate, normalize, and persist one annotated-image upload.
pub async fn ingest(
    store: &DatasetStore,
    payload: UploadPayload,
) -> Result<IngestReceipt, CoreError> {
    let id = Uuid::new_v4().to_string();

    let bytes = STANDARD
        .decode(payload.annotated_image_file.trim())
        .map_err(|e| CoreError::InvalidImageData(format!("undecodable base64 payload: {e}")))?;

    let format = image::guess_format(&bytes)
        .map_err(|e| CoreError::InvalidImageData(format!("unrecognized image format: {e}")))?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| CoreError::InvalidImageData(format!("undecodable raster image: {e}")))?;
    let (width, height) = decoded.dimensions();

    let image_filename = format!("{id}.{}", extension_for(format));
    store.write_image(&image_filename, &bytes).await?;

    if width == 0 || height == 0 {
        // Observed legacy behavior: not an ingestion failure, but nothing
        // can be normalized against a zero-sized axis.
        tracing::warn!(id, width, height, "Image has a zero dimension, all annotations will be skipped");
    }

    let outcome = build_label_lines(&payload.annotations, width, height);
    let label_filename = format!("{id}.txt");
    store.write_labels(&label_filename, &outcome.lines).await?;

    let document = RecordDocument {
        metadata: payload.metadata,
        annotations: payload.annotations,
    };
    store.write_metadata(&format!("{id}.json"), &document).await?;

    tracing::info!(
        id,
        image_filename,
        width,
        height,
        valid = outcome.valid,
        skipped = outcome.skipped,
        "Stored annotated image record"
    );

    Ok(IngestReceipt {
        id,
        image_filename,
        label_filename,
        valid_annotations: outcome.valid,
        skipped_annotations: outcome.skipped,
    })
}

/// File extension for the sniffed image format.
fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        other => other.extensions_str().first().copied().unwrap_or("png"),
    }
}
