//! Bounding-box normalization for YOLO-style label files.
//!
//! An annotation is valid when it carries exactly two corner points that
//! span a non-degenerate box. Valid boxes become one label line each in
//! `<class> <x_center> <y_center> <width> <height>` form, all four values
//! normalized to [0,1] by the image dimensions, six-decimal fixed.

use serde_json::Value;

use crate::types::AnnotationPoint;

/// Single-class dataset: every label line uses class index 0.
pub const LABEL_CLASS: u32 = 0;

/// A bounding box in normalized center/size form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    /// Render as a label-file line with six-decimal fixed precision.
    pub fn to_label_line(self) -> String {
        format!(
            "{LABEL_CLASS} {:.6} {:.6} {:.6} {:.6}",
            self.x_center, self.y_center, self.width, self.height
        )
    }
}

/// Label lines plus the valid/skipped counters ingestion reports back.
#[derive(Debug, Default)]
pub struct LabelOutcome {
    pub lines: Vec<String>,
    pub valid: usize,
    pub skipped: usize,
}

/// Extract the two corner points of an annotation value.
///
/// Returns `None` unless the annotation has a `points` array with exactly
/// two numeric `{x, y}` entries.
pub fn corner_points(annotation: &Value) -> Option<(AnnotationPoint, AnnotationPoint)> {
    let points = annotation.get("points")?.as_array()?;
    if points.len() != 2 {
        return None;
    }
    let point = |v: &Value| -> Option<AnnotationPoint> {
        Some(AnnotationPoint {
            x: v.get("x")?.as_f64()?,
            y: v.get("y")?.as_f64()?,
        })
    };
    Some((point(&points[0])?, point(&points[1])?))
}

/// Normalize a two-corner box to center/size form.
///
/// Returns `None` for zero-dimension images (the division is undefined)
/// and for degenerate boxes where the corners coincide on either axis.
pub fn normalize_box(
    p1: AnnotationPoint,
    p2: AnnotationPoint,
    img_width: u32,
    img_height: u32,
) -> Option<NormalizedBox> {
    if img_width == 0 || img_height == 0 {
        return None;
    }
    let w = f64::from(img_width);
    let h = f64::from(img_height);

    let xmin = p1.x.min(p2.x);
    let xmax = p1.x.max(p2.x);
    let ymin = p1.y.min(p2.y);
    let ymax = p1.y.max(p2.y);

    let width = (xmax - xmin) / w;
    let height = (ymax - ymin) / h;
    if width == 0.0 || height == 0.0 {
        return None;
    }

    Some(NormalizedBox {
        x_center: (xmin + xmax) / (2.0 * w),
        y_center: (ymin + ymax) / (2.0 * h),
        width,
        height,
    })
}

/// Build label lines for every annotation, in input order.
///
/// Invalid annotations (wrong point count, degenerate box) are skipped and
/// counted, never fatal.
pub fn build_label_lines(annotations: &[Value], img_width: u32, img_height: u32) -> LabelOutcome {
    let mut outcome = LabelOutcome::default();
    for annotation in annotations {
        let Some((p1, p2)) = corner_points(annotation) else {
            outcome.skipped += 1;
            continue;
        };
        match normalize_box(p1, p2, img_width, img_height) {
            Some(bbox) => {
                outcome.lines.push(bbox.to_label_line());
                outcome.valid += 1;
            }
            None => outcome.skipped += 1,
        }
    }
    outcome
}

/// Cells of a stored legacy `bbox` array, null-padded to four.
///
/// Any stored array takes precedence over the corner points. Summaries and
/// the exporter both go through here so they agree on the same file.
pub fn stored_bbox_cells(annotation: &Value) -> Option<[Value; 4]> {
    let bbox = annotation.get("bbox").and_then(Value::as_array)?;
    Some(std::array::from_fn(|i| {
        bbox.get(i).cloned().unwrap_or(Value::Null)
    }))
}

/// Derive a `[x, y, width, height]` display box from an annotation value.
///
/// A stored `bbox` array wins; one that is short or non-numeric makes the
/// annotation undisplayable rather than falling back. Without a stored
/// array the box is derived from the two corner points as the original
/// tooling did (first point plus signed delta, no min/max reordering).
pub fn display_box(annotation: &Value) -> Option<[f64; 4]> {
    if let Some(cells) = stored_bbox_cells(annotation) {
        let mut out = [0.0; 4];
        for (slot, v) in out.iter_mut().zip(&cells) {
            *slot = v.as_f64()?;
        }
        return Some(out);
    }
    let (p1, p2) = corner_points(annotation)?;
    Some([p1.x, p1.y, p2.x - p1.x, p2.y - p1.y])
}
