//! The normalized YOLO label record.

use std::fmt;
use std::path::Path;

use super::{BBoxXYXY, Normalized, Pixel};
use crate::error::ArenaLabelError;

/// Class ids are small non-negative integers indexing the descriptor's
/// `names` list.
pub type ClassId = u32;

/// One line of a YOLO label file: class plus center/size, all in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedLabel {
    pub class_id: ClassId,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl NormalizedLabel {
    /// Encodes a pixel-space box drawn on an image of the given size.
    ///
    /// Values are clamped to `[0, 1]` so float noise on boxes touching the
    /// image border cannot produce an out-of-range record.
    pub fn from_pixel_box(
        class_id: ClassId,
        bbox: &BBoxXYXY<Pixel>,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let norm = bbox.to_normalized(image_width as f64, image_height as f64);
        let (cx, cy, w, h) = norm.to_cxcywh();
        Self {
            class_id,
            cx: cx.clamp(0.0, 1.0),
            cy: cy.clamp(0.0, 1.0),
            w: w.clamp(0.0, 1.0),
            h: h.clamp(0.0, 1.0),
        }
    }

    pub fn to_normalized_box(&self) -> BBoxXYXY<Normalized> {
        BBoxXYXY::from_cxcywh(self.cx, self.cy, self.w, self.h)
    }

    pub fn to_pixel_box(&self, image_width: u32, image_height: u32) -> BBoxXYXY<Pixel> {
        self.to_normalized_box()
            .to_pixel(image_width as f64, image_height as f64)
    }

    pub fn is_in_unit_range(&self) -> bool {
        [self.cx, self.cy, self.w, self.h]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

impl fmt::Display for NormalizedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.cx, self.cy, self.w, self.h
        )
    }
}

/// A parsed label line; detector output carries a trailing confidence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelRow {
    pub label: NormalizedLabel,
    pub confidence: Option<f64>,
}

/// Parses one label line. Blank lines yield `Ok(None)`.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<LabelRow>, ArenaLabelError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 7 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(7).collect();

    if tokens.len() < 5 {
        return Err(label_parse_error(
            file_path,
            line_num,
            format!("expected 5 tokens, found {}", tokens.len()),
        ));
    }

    if tokens.len() > 6 {
        return Err(label_parse_error(
            file_path,
            line_num,
            "segmentation/pose rows are not supported; expected a detection box".to_string(),
        ));
    }

    let class_id = tokens[0].parse::<ClassId>().map_err(|_| {
        label_parse_error(
            file_path,
            line_num,
            format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        )
    })?;

    let cx = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let w = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let h = parse_f64_token(tokens[4], "height", file_path, line_num)?;
    let confidence = match tokens.get(5) {
        Some(raw) => Some(parse_f64_token(raw, "confidence", file_path, line_num)?),
        None => None,
    };

    Ok(Some(LabelRow {
        label: NormalizedLabel {
            class_id,
            cx,
            cy,
            w,
            h,
        },
        confidence,
    }))
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, ArenaLabelError> {
    raw.parse::<f64>().map_err(|_| {
        label_parse_error(
            file_path,
            line_num,
            format!("invalid {field_name} '{raw}'; expected floating-point number"),
        )
    })
}

fn label_parse_error(path: &Path, line: usize, message: String) -> ArenaLabelError {
    ArenaLabelError::LabelParse {
        path: path.to_path_buf(),
        line,
        message,
    }
}
