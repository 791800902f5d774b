//! On-disk dataset store.
//!
//! Owns the directory contract shared by ingestion and export:
//!
//! ```text
//! dataset/
//!   images/<id>.<ext>
//!   labels/<id>.txt
//!   data/<id>.json
//! ```
//!
//! There is no locking and no cross-file atomicity; concurrent readers may
//! observe a metadata file before its image exists. Every read path treats
//! a metadata file without a matching image as an absent record.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::CoreError;
use crate::export::record_annotations;
use crate::labels::display_box;
use crate::types::{CaptureMetadata, RecordDocument, RecordSummary};

/// Public URL prefix under which the images subtree is served.
pub const IMAGES_URL_PREFIX: &str = "/dataset/images";

/// Handle on the dataset root directory.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn labels_dir(&self) -> PathBuf {
        self.root.join("labels")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Create the three dataset subdirectories if they do not exist.
    pub async fn ensure_layout(&self) -> Result<(), CoreError> {
        for dir in [self.images_dir(), self.labels_dir(), self.data_dir()] {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                CoreError::StorageWriteFailed(format!(
                    "could not create {}: {e}",
                    dir.display()
                ))
            })?;
        }
        Ok(())
    }

    /// Write the raster bytes to `images/<filename>`.
    pub async fn write_image(&self, filename: &str, bytes: &[u8]) -> Result<(), CoreError> {
        let path = self.images_dir().join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| write_failed("image", &path, e))
    }

    /// Write the label file to `labels/<filename>`.
    ///
    /// Zero lines produce an empty file, which is valid output ("no
    /// detections").
    pub async fn write_labels(&self, filename: &str, lines: &[String]) -> Result<(), CoreError> {
        let mut contents = lines.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        let path = self.labels_dir().join(filename);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| write_failed("label", &path, e))
    }

    /// Serialize and write the metadata document to `data/<filename>`.
    pub async fn write_metadata(
        &self,
        filename: &str,
        document: &RecordDocument,
    ) -> Result<(), CoreError> {
        let json = serde_json::to_vec(document)
            .map_err(|e| CoreError::StorageWriteFailed(format!("metadata serialization: {e}")))?;
        let path = self.data_dir().join(filename);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| write_failed("metadata", &path, e))
    }

    /// Find the stored image filename for `id`, whatever its extension.
    pub async fn find_image_filename(&self, id: &str) -> Option<String> {
        let mut entries = tokio::fs::read_dir(self.images_dir()).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if Path::new(&name).file_stem().is_some_and(|stem| stem == id) {
                return Some(name);
            }
        }
        None
    }

    /// Load one record summary by id.
    ///
    /// A missing or unparseable metadata file, or a metadata file without a
    /// matching image, both answer `NotFound`.
    pub async fn load_summary(&self, id: &str) -> Result<RecordSummary, CoreError> {
        let not_found = || CoreError::NotFound {
            entity: "Record",
            id: id.to_string(),
        };

        let path = self.data_dir().join(format!("{id}.json"));
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|_| not_found())?;
        let doc: Value = serde_json::from_str(&raw).map_err(|_| not_found())?;

        let image_filename = self.find_image_filename(id).await.ok_or_else(not_found)?;
        Ok(summary_from_document(id, &image_filename, &doc))
    }

    /// List summaries for every stored record with an existing image.
    ///
    /// Records whose metadata cannot be parsed or whose image is missing
    /// are skipped, not errors; an export running concurrently with an
    /// upload may legitimately observe half-written records.
    pub async fn list_summaries(&self) -> Result<Vec<RecordSummary>, CoreError> {
        let mut summaries = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(self.data_dir()).await else {
            return Ok(summaries);
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(id) = name.strip_suffix(".json") else {
                continue;
            };
            match self.load_summary(id).await {
                Ok(summary) => summaries.push(summary),
                Err(CoreError::NotFound { .. }) => {
                    tracing::debug!(id, "Skipping record without a readable metadata+image pair");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summaries)
    }
}

fn write_failed(artifact: &str, path: &Path, err: std::io::Error) -> CoreError {
    tracing::error!(artifact, path = %path.display(), error = %err, "Dataset write failed");
    CoreError::StorageWriteFailed(format!("{artifact} write to {}: {err}", path.display()))
}

/// Flatten a parsed metadata document into the summary the history
/// endpoints serve.
fn summary_from_document(id: &str, image_filename: &str, doc: &Value) -> RecordSummary {
    // Unknown keys are dropped, legacy aliases accepted.
    let metadata: CaptureMetadata =
        serde_json::from_value(doc.clone()).unwrap_or_default();

    let annotations = record_annotations(doc)
        .iter()
        .filter_map(display_box)
        .collect();

    RecordSummary {
        id: id.to_string(),
        image_url: format!("{IMAGES_URL_PREFIX}/{image_filename}"),
        annotations,
        dia_entrada: metadata.dia_entrada,
        temperatura: metadata.temperatura,
        humedad: metadata.humedad,
        sala: metadata.sala,
        muestra: metadata.muestra,
        fecha: metadata.fecha,
        hora: metadata.hora,
        temp_compost: metadata.temp_compost,
        co2: metadata.co2,
        circulacion: metadata.circulacion,
        observaciones: metadata.observaciones,
    }
}
