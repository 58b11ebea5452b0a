//! Per-pixel class label grids.
//!
//! A `LabelMap` is the parsed form of a prediction: one class index per pixel,
//! stored row-major. Construction validates that the grid is non-empty and
//! rectangular so the decoder never sees a partial row.

use serde_json::Value;

use crate::error::DecodeError;

/// Rectangular grid of class indices, shape (height, width).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelMap {
    width: usize,
    height: usize,
    labels: Vec<u32>,
}

impl LabelMap {
    /// Builds a label map from a row-major buffer.
    pub fn from_raw(width: usize, height: usize, labels: Vec<u32>) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::Shape(format!(
                "label map must be non-empty, got {}x{}",
                width, height
            )));
        }
        let expected = width
            .checked_mul(height)
            .ok_or_else(|| DecodeError::Shape("label map dimensions overflow".to_string()))?;
        if labels.len() != expected {
            return Err(DecodeError::Shape(format!(
                "expected {} labels for {}x{}, got {}",
                expected,
                width,
                height,
                labels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            labels,
        })
    }

    /// Builds a label map from nested rows. All rows must share one length.
    pub fn from_rows<R>(rows: &[R]) -> Result<Self, DecodeError>
    where
        R: AsRef<[u32]>,
    {
        let height = rows.len();
        let width = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);
        let mut labels = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(ragged_row(y, row.len(), width));
            }
            labels.extend_from_slice(row);
        }
        Self::from_raw(width, height, labels)
    }

    /// Parses a nested JSON array (`[[0, 1], [7, 2]]`) into a label map.
    ///
    /// Integral floats such as `3.0` are accepted since array serializers
    /// commonly emit them for integer masks. Negative labels and labels beyond
    /// `u32::MAX` are stored as `u32::MAX`, which no palette covers, so they
    /// decode as void like any other out-of-range label.
    pub fn from_json(value: &Value) -> Result<Self, DecodeError> {
        let rows = value
            .as_array()
            .ok_or_else(|| DecodeError::Shape("label map must be an array of rows".to_string()))?;
        let height = rows.len();
        let mut width = 0;
        let mut labels = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            let cells = row
                .as_array()
                .ok_or_else(|| DecodeError::Shape(format!("row {} is not an array", y)))?;
            if y == 0 {
                width = cells.len();
                labels.reserve(width.saturating_mul(height));
            } else if cells.len() != width {
                return Err(ragged_row(y, cells.len(), width));
            }
            for (x, cell) in cells.iter().enumerate() {
                labels.push(json_label(cell).ok_or_else(|| DecodeError::InvalidLabel {
                    row: y,
                    col: x,
                    value: cell.to_string(),
                })?);
            }
        }
        Self::from_raw(width, height, labels)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Label at (row, col), if inside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.labels.get(row * self.width + col).copied()
    }

    /// Row-major labels.
    pub fn as_slice(&self) -> &[u32] {
        &self.labels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.labels.chunks_exact(self.width)
    }
}

fn ragged_row(row: usize, len: usize, width: usize) -> DecodeError {
    DecodeError::Shape(format!(
        "row {} has {} labels, expected {}",
        row, len, width
    ))
}

fn json_label(cell: &Value) -> Option<u32> {
    if let Some(v) = cell.as_u64() {
        return Some(u32::try_from(v).unwrap_or(u32::MAX));
    }
    if cell.as_i64().is_some() {
        return Some(u32::MAX);
    }
    let f = cell.as_f64()?;
    if f.fract() != 0.0 {
        return None;
    }
    if f < 0.0 || f > u32::MAX as f64 {
        Some(u32::MAX)
    } else {
        Some(f as u32)
    }
}
