//! Dataset flattening for the report pipeline.
//!
//! A metadata document becomes one row per annotation, or a single row with
//! null bbox fields when it has none. Flattening is pure over parsed JSON
//! values; [`scan_dataset`] is the thin filesystem shim that feeds it and
//! collects the filenames that could not be read or parsed.
//!
//! Two naming conventions coexist in old datasets (`anotaciones` vs
//! `annotations`, stored `bbox` vs raw corner `points`); both are read here
//! and must stay that way for previously stored files to keep exporting.

use std::path::Path;

use serde_json::Value;

/// One flattened (record, annotation) row.
///
/// Cells stay as raw JSON values: the report reproduces whatever was
/// stored, including nulls and mixed types.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub nombre_archivo: Value,
    pub dia_entrada: Value,
    pub fecha: Value,
    pub hora: Value,
    pub sala: Value,
    pub muestra: Value,
    pub temperatura: Value,
    pub humedad: Value,
    pub temp_compost: Value,
    pub co2: Value,
    pub circulacion: Value,
    pub observaciones: Value,
    pub estado: Value,
    pub comentarios: Value,
    pub label_anotacion: Value,
    pub bbox_x: Value,
    pub bbox_y: Value,
    pub bbox_width: Value,
    pub bbox_height: Value,
}

impl ExportRow {
    /// Column headers, in spreadsheet order.
    pub const COLUMNS: [&'static str; 19] = [
        "nombre_archivo",
        "dia_entrada",
        "fecha",
        "hora",
        "sala",
        "muestra",
        "temperatura",
        "humedad",
        "temp_compost",
        "co2",
        "circulacion",
        "observaciones",
        "estado",
        "comentarios",
        "label_anotacion",
        "bbox_x",
        "bbox_y",
        "bbox_width",
        "bbox_height",
    ];

    /// Cells in the same order as [`Self::COLUMNS`].
    pub fn cells(&self) -> [&Value; 19] {
        [
            &self.nombre_archivo,
            &self.dia_entrada,
            &self.fecha,
            &self.hora,
            &self.sala,
            &self.muestra,
            &self.temperatura,
            &self.humedad,
            &self.temp_compost,
            &self.co2,
            &self.circulacion,
            &self.observaciones,
            &self.estado,
            &self.comentarios,
            &self.label_anotacion,
            &self.bbox_x,
            &self.bbox_y,
            &self.bbox_width,
            &self.bbox_height,
        ]
    }
}

/// The flattened dataset: data rows plus the audit list of files that
/// could not be parsed.
#[derive(Debug, Default)]
pub struct DatasetTable {
    pub rows: Vec<ExportRow>,
    pub malformed: Vec<String>,
}

/// Read a record's annotations under either naming convention.
///
/// `anotaciones` wins when present; `annotations` is the fallback. An
/// explicit null under `anotaciones` counts as absent, old files store
/// that and still expect the fallback.
pub fn record_annotations(doc: &Value) -> &[Value] {
    doc.get("anotaciones")
        .filter(|v| !v.is_null())
        .or_else(|| doc.get("annotations"))
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

/// Flatten one parsed metadata document into export rows.
pub fn flatten_document(filename: &str, doc: &Value) -> Vec<ExportRow> {
    let field = |key: &str| doc.get(key).cloned().unwrap_or(Value::Null);

    let base = ExportRow {
        nombre_archivo: doc
            .get("nombre")
            .cloned()
            .unwrap_or_else(|| Value::String(filename.to_string())),
        dia_entrada: field("dia_entrada"),
        fecha: field("fecha"),
        hora: field("hora"),
        sala: field("sala"),
        muestra: field("muestra"),
        temperatura: field("temperatura"),
        humedad: field("humedad"),
        temp_compost: field("temp_compost"),
        co2: field("co2"),
        circulacion: field("circulacion"),
        observaciones: field("observaciones"),
        estado: field("estado"),
        comentarios: field("comentarios"),
        label_anotacion: Value::Null,
        bbox_x: Value::Null,
        bbox_y: Value::Null,
        bbox_width: Value::Null,
        bbox_height: Value::Null,
    };

    let annotations = record_annotations(doc);
    if annotations.is_empty() {
        return vec![base];
    }

    annotations
        .iter()
        .map(|annotation| {
            let [x, y, width, height] = annotation_bbox(annotation);
            ExportRow {
                label_anotacion: annotation.get("label").cloned().unwrap_or(Value::Null),
                bbox_x: x,
                bbox_y: y,
                bbox_width: width,
                bbox_height: height,
                ..base.clone()
            }
        })
        .collect()
}

/// Resolve an annotation's `[x, y, width, height]` cells.
///
/// A stored `bbox` array is copied through verbatim (null-padded to four
/// cells); otherwise the box is derived from exactly two corner points as
/// top-left plus signed size; otherwise all four cells are null so the row
/// is kept rather than dropped.
fn annotation_bbox(annotation: &Value) -> [Value; 4] {
    if let Some(cells) = crate::labels::stored_bbox_cells(annotation) {
        return cells;
    }

    if let Some((p1, p2)) = crate::labels::corner_points(annotation) {
        return [
            Value::from(p1.x),
            Value::from(p1.y),
            Value::from(p2.x - p1.x),
            Value::from(p2.y - p1.y),
        ];
    }

    [Value::Null, Value::Null, Value::Null, Value::Null]
}

/// Scan the metadata directory and flatten every `.json` file.
///
/// One unreadable or unparseable file never aborts the scan; it is logged
/// and recorded in the malformed list instead. A missing directory yields
/// an empty table.
pub fn scan_dataset(data_dir: &Path) -> DatasetTable {
    let mut table = DatasetTable::default();

    let entries = match std::fs::read_dir(data_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %data_dir.display(), error = %e, "Data directory not readable");
            return table;
        }
    };

    for entry in entries.flatten() {
        let filename = entry.file_name().to_string_lossy().into_owned();
        if !filename.ends_with(".json") {
            continue;
        }
        let parsed = std::fs::read_to_string(entry.path())
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string()));
        match parsed {
            Ok(doc) => table.rows.extend(flatten_document(&filename, &doc)),
            Err(e) => {
                tracing::warn!(filename, error = %e, "Omitting malformed metadata file");
                table.malformed.push(filename);
            }
        }
    }

    table
}
