//! Export artifact builders: spreadsheet and zip bundles.
//!
//! Everything here is synchronous and builds its payload fully in memory
//! before it is handed back; dataset size is assumed bounded to what fits
//! in memory, an explicit scalability ceiling of this service. The HTTP
//! layer runs these on a blocking task so they never stall the runtime.

use std::io::{Cursor, Write};
use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::CoreError;
use crate::export::{scan_dataset, DatasetTable, ExportRow};

/// Download filename for the raw dataset bundle.
pub const RAW_BUNDLE_FILENAME: &str = "dataset_raw.zip";

/// Download filename for the report bundle (spreadsheet + images).
pub const REPORT_BUNDLE_FILENAME: &str = "informe_dataset.zip";

/// Filename of the spreadsheet, standalone and inside the report bundle.
pub const SPREADSHEET_FILENAME: &str = "dataset_anotaciones.xlsx";

/// Sheet holding the flattened annotation rows.
const DATA_SHEET: &str = "Anotaciones";

/// Audit sheet listing metadata files omitted from the data sheet.
const AUDIT_SHEET: &str = "Archivos Omitidos";

/// Stale artifacts from earlier tooling that may linger inside old dataset
/// trees; never part of the dataset.
const SKIPPED_DIR: &str = "__pycache__";
const SKIPPED_SUFFIX: &str = ".pyc";

fn io_failed(context: &str, err: std::io::Error) -> CoreError {
    CoreError::ExportFailed(format!("{context}: {err}"))
}

fn zip_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

/// Build the flattened-dataset spreadsheet for `dataset_root` in memory.
pub fn build_spreadsheet(dataset_root: &Path) -> Result<Vec<u8>, CoreError> {
    let table = scan_dataset(&dataset_root.join("data"));
    spreadsheet_from_table(&table)
}

/// Render a [`DatasetTable`] as a multi-sheet xlsx buffer.
pub fn spreadsheet_from_table(table: &DatasetTable) -> Result<Vec<u8>, CoreError> {
    tracing::info!(
        rows = table.rows.len(),
        malformed = table.malformed.len(),
        "Building dataset spreadsheet in memory"
    );

    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(DATA_SHEET)?;
    for (col, name) in ExportRow::COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col, cell) in row.cells().iter().enumerate() {
            write_cell(sheet, row_idx as u32 + 1, col as u16, cell)?;
        }
    }

    if !table.malformed.is_empty() {
        let audit = workbook.add_worksheet();
        audit.set_name(AUDIT_SHEET)?;
        audit.write_string(0, 0, "archivos_omitidos")?;
        for (row_idx, filename) in table.malformed.iter().enumerate() {
            audit.write_string(row_idx as u32 + 1, 0, filename)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write one JSON cell value; nulls stay as empty cells.
fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
) -> Result<(), CoreError> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                sheet.write_number(row, col, f)?;
            }
            None => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            sheet.write_string(row, col, s)?;
        }
        other => {
            sheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Zip bundles
// ---------------------------------------------------------------------------

/// Package the whole dataset tree into a zip archive, preserving relative
/// paths and keeping empty directories as explicit entries.
pub fn build_raw_bundle(dataset_root: &Path) -> Result<Vec<u8>, CoreError> {
    tracing::info!(root = %dataset_root.display(), "Building raw dataset bundle");

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    add_tree(&mut writer, dataset_root, dataset_root)?;
    Ok(writer.finish()?.into_inner())
}

fn add_tree(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    root: &Path,
    dir: &Path,
) -> Result<(), CoreError> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| io_failed("reading dataset directory", e))?
        .flatten()
        .collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);

    if entries.is_empty() && dir != root {
        let rel = relative_name(root, dir);
        writer.add_directory(rel, zip_options())?;
        return Ok(());
    }

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == SKIPPED_DIR || name.ends_with(SKIPPED_SUFFIX) {
            continue;
        }
        if path.is_dir() {
            add_tree(writer, root, &path)?;
        } else {
            let bytes =
                std::fs::read(&path).map_err(|e| io_failed("reading dataset file", e))?;
            writer.start_file(relative_name(root, &path), zip_options())?;
            writer
                .write_all(&bytes)
                .map_err(|e| io_failed("writing zip entry", e))?;
        }
    }
    Ok(())
}

/// Archive entry name for `path`, relative to `root`, with `/` separators.
fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Package the spreadsheet together with every image into a zip archive.
///
/// A missing images directory is a warning, not a failure; the bundle then
/// carries the spreadsheet alone.
pub fn build_report_bundle(dataset_root: &Path) -> Result<Vec<u8>, CoreError> {
    tracing::info!(root = %dataset_root.display(), "Building report bundle");

    let spreadsheet = build_spreadsheet(dataset_root)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(SPREADSHEET_FILENAME, zip_options())?;
    writer
        .write_all(&spreadsheet)
        .map_err(|e| io_failed("writing spreadsheet entry", e))?;

    let images_dir = dataset_root.join("images");
    match std::fs::read_dir(&images_dir) {
        Ok(entries) => {
            let mut entries: Vec<_> = entries.flatten().collect();
            entries.sort_by_key(std::fs::DirEntry::file_name);
            for entry in entries {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                let bytes =
                    std::fs::read(&path).map_err(|e| io_failed("reading image file", e))?;
                writer.start_file(format!("images/{name}"), zip_options())?;
                writer
                    .write_all(&bytes)
                    .map_err(|e| io_failed("writing image entry", e))?;
            }
        }
        Err(e) => {
            tracing::warn!(dir = %images_dir.display(), error = %e, "Images directory not found, bundling spreadsheet only");
        }
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn archive_names(bytes: Vec<u8>) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(String::from).collect()
    }

    fn seed_dataset(root: &Path) {
        std::fs::create_dir_all(root.join("images")).unwrap();
        std::fs::create_dir_all(root.join("labels")).unwrap();
        std::fs::create_dir_all(root.join("data")).unwrap();
        std::fs::write(root.join("images/a.png"), b"img-bytes").unwrap();
        std::fs::write(root.join("labels/a.txt"), "0 0.2 0.3 0.2 0.2\n").unwrap();
        std::fs::write(
            root.join("data/a.json"),
            json!({"sala": "1", "annotations": []}).to_string(),
        )
        .unwrap();
    }

    #[test]
    fn raw_bundle_preserves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("dataset");
        seed_dataset(&root);

        let names = archive_names(build_raw_bundle(&root).unwrap());
        assert!(names.contains(&"images/a.png".to_string()));
        assert!(names.contains(&"labels/a.txt".to_string()));
        assert!(names.contains(&"data/a.json".to_string()));
    }

    #[test]
    fn raw_bundle_keeps_empty_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("dataset");
        seed_dataset(&root);
        std::fs::create_dir_all(root.join("spare")).unwrap();

        let names = archive_names(build_raw_bundle(&root).unwrap());
        assert!(names.iter().any(|n| n.trim_end_matches('/') == "spare"));
    }

    #[test]
    fn raw_bundle_skips_cache_artifacts() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("dataset");
        seed_dataset(&root);
        std::fs::write(root.join("data/stale.pyc"), b"x").unwrap();

        let names = archive_names(build_raw_bundle(&root).unwrap());
        assert!(!names.iter().any(|n| n.ends_with(".pyc")));
    }

    #[test]
    fn report_bundle_contains_spreadsheet_and_images() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("dataset");
        seed_dataset(&root);

        let bytes = build_report_bundle(&root).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(String::from).collect();
        assert!(names.contains(&SPREADSHEET_FILENAME.to_string()));
        assert!(names.contains(&"images/a.png".to_string()));

        let mut image = archive.by_name("images/a.png").unwrap();
        let mut contents = Vec::new();
        image.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"img-bytes");
    }

    #[test]
    fn report_bundle_tolerates_missing_images_dir() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("dataset");
        std::fs::create_dir_all(root.join("data")).unwrap();

        let names = archive_names(build_report_bundle(&root).unwrap());
        assert_eq!(names, vec![SPREADSHEET_FILENAME.to_string()]);
    }

    #[test]
    fn spreadsheet_buffer_is_an_xlsx_container() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("dataset");
        seed_dataset(&root);

        let bytes = build_spreadsheet(&root).unwrap();
        // xlsx is a zip container; check the magic and that it opens.
        assert_eq!(&bytes[..2], b"PK");
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.len() > 0);
    }

    #[test]
    fn audit_sheet_only_exists_when_files_were_malformed() {
        let clean = DatasetTable::default();
        let bytes = spreadsheet_from_table(&clean).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let sheets: Vec<&str> = archive
            .file_names()
            .filter(|n| n.starts_with("xl/worksheets/"))
            .collect();
        assert_eq!(sheets.len(), 1);

        let mut dirty = DatasetTable::default();
        dirty.malformed.push("bad.json".to_string());
        let bytes = spreadsheet_from_table(&dirty).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let sheets: Vec<&str> = archive
            .file_names()
            .filter(|n| n.starts_with("xl/worksheets/"))
            .collect();
        assert_eq!(sheets.len(), 2);
    }
}
