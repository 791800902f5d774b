//! Payload and record types shared by ingestion and the HTTP layer.
//!
//! Metadata fields are carried as raw [`serde_json::Value`] so whatever the
//! client submitted (numbers, strings, explicit nulls) survives the round
//! trip to `data/<id>.json` unchanged. The serde aliases accept the
//! frontend's camelCase field names alongside the stored snake_case ones.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A pixel coordinate in the source image's coordinate space.
///
/// No bounds invariant: points may lie outside the image extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPoint {
    pub x: f64,
    pub y: f64,
}

/// Environmental and contextual fields recorded with each capture.
///
/// Every field is independently nullable and defaults to `null`, so the
/// metadata file always contains the full key set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureMetadata {
    #[serde(default, alias = "diaEntrada")]
    pub dia_entrada: Value,
    /// Ambient temperature; the upload form calls this `tempAmbiente`.
    #[serde(default, alias = "tempAmbiente")]
    pub temperatura: Value,
    #[serde(default)]
    pub humedad: Value,
    #[serde(default)]
    pub sala: Value,
    #[serde(default)]
    pub muestra: Value,
    #[serde(default)]
    pub fecha: Value,
    #[serde(default)]
    pub hora: Value,
    #[serde(default, alias = "tempCompost")]
    pub temp_compost: Value,
    #[serde(default)]
    pub co2: Value,
    #[serde(default)]
    pub circulacion: Value,
    #[serde(default)]
    pub observaciones: Value,
}

/// An annotated-image upload as received over the wire.
///
/// Annotations are kept as raw JSON values rather than a typed struct:
/// the metadata file must preserve the submitted array verbatim, including
/// keys (`label`, `bbox`, ...) this service does not interpret at ingest
/// time but the exporter reads back later.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadPayload {
    #[serde(alias = "annotatedImageFile")]
    pub annotated_image_file: String,
    #[serde(default)]
    pub annotations: Vec<Value>,
    #[serde(flatten)]
    pub metadata: CaptureMetadata,
}

/// The JSON document persisted at `data/<id>.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RecordDocument {
    #[serde(flatten)]
    pub metadata: CaptureMetadata,
    pub annotations: Vec<Value>,
}

/// What ingestion reports back for one stored record.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub id: String,
    pub image_filename: String,
    pub label_filename: String,
    pub valid_annotations: usize,
    pub skipped_annotations: usize,
}

/// A flattened per-record view served by the history endpoints.
///
/// Field names follow the frontend contract (camelCase, display boxes as
/// `[x, y, width, height]` arrays).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub id: String,
    pub image_url: String,
    pub annotations: Vec<[f64; 4]>,
    pub dia_entrada: Value,
    pub temperatura: Value,
    pub humedad: Value,
    pub sala: Value,
    pub muestra: Value,
    pub fecha: Value,
    pub hora: Value,
    pub temp_compost: Value,
    pub co2: Value,
    pub circulacion: Value,
    pub observaciones: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upload_payload_accepts_camel_case_field_names() {
        let payload: UploadPayload = serde_json::from_value(json!({
            "annotatedImageFile": "aGVsbG8=",
            "annotations": [],
            "diaEntrada": "3",
            "tempAmbiente": 21.5,
            "tempCompost": "24.1",
            "sala": "2"
        }))
        .unwrap();

        assert_eq!(payload.metadata.dia_entrada, json!("3"));
        assert_eq!(payload.metadata.temperatura, json!(21.5));
        assert_eq!(payload.metadata.temp_compost, json!("24.1"));
        assert_eq!(payload.metadata.sala, json!("2"));
        assert_eq!(payload.metadata.humedad, Value::Null);
    }

    #[test]
    fn upload_payload_accepts_snake_case_field_names() {
        let payload: UploadPayload = serde_json::from_value(json!({
            "annotated_image_file": "aGVsbG8=",
            "dia_entrada": 5,
            "temperatura": 19
        }))
        .unwrap();

        assert_eq!(payload.metadata.dia_entrada, json!(5));
        assert_eq!(payload.metadata.temperatura, json!(19));
    }

    #[test]
    fn record_document_serializes_every_metadata_key() {
        let doc = RecordDocument {
            metadata: CaptureMetadata::default(),
            annotations: vec![],
        };
        let value = serde_json::to_value(&doc).unwrap();
        let obj = value.as_object().unwrap();

        for key in [
            "dia_entrada",
            "temperatura",
            "humedad",
            "sala",
            "muestra",
            "fecha",
            "hora",
            "temp_compost",
            "co2",
            "circulacion",
            "observaciones",
            "annotations",
        ] {
            assert!(obj.contains_key(key), "missing key '{key}'");
        }
        assert_eq!(obj["temperatura"], Value::Null);
    }

    #[test]
    fn explicit_null_metadata_survives_round_trip() {
        let payload: UploadPayload = serde_json::from_value(json!({
            "annotatedImageFile": "aGVsbG8=",
            "observaciones": null
        }))
        .unwrap();
        let doc = RecordDocument {
            metadata: payload.metadata,
            annotations: payload.annotations,
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["observaciones"], Value::Null);
    }
}
