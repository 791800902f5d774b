use thiserror::Error;

/// Domain-level error type shared by ingestion and export.
///
/// Malformed metadata encountered during export is deliberately NOT a
/// variant here: the exporter absorbs it into an audit list and keeps
/// scanning instead of failing the operation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The uploaded payload could not be decoded as base64 or as a
    /// raster image. Raised before anything touches the disk.
    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    /// A disk write failed while persisting one of the three record
    /// artifacts. Carries the original cause text; partial writes are
    /// left on disk and not rolled back.
    #[error("Storage write failed: {0}")]
    StorageWriteFailed(String),

    /// A requested record has no matching metadata+image pair.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Failure while assembling an export artifact in memory.
    #[error("Export failed: {0}")]
    ExportFailed(String),
}

impl From<rust_xlsxwriter::XlsxError> for CoreError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        CoreError::ExportFailed(err.to_string())
    }
}

impl From<zip::result::ZipError> for CoreError {
    fn from(err: zip::result::ZipError) -> Self {
        CoreError::ExportFailed(err.to_string())
    }
}
