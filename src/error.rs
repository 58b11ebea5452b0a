use thiserror::Error;

/// Errors raised by the decode core (label maps, palettes, overlays).
///
/// I/O-facing layers wrap these in `anyhow::Error` with context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Caller setup mistake, e.g. more classes requested than the palette holds.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Grid is empty, ragged, or does not match a companion image.
    #[error("shape error: {0}")]
    Shape(String),

    /// Cell in a label map that is not a non-negative integer.
    #[error("invalid label at row {row}, col {col}: {value}")]
    InvalidLabel {
        row: usize,
        col: usize,
        value: String,
    },

    /// Label outside `0..num_classes` while decoding in strict mode.
    #[error("label {label} at row {row}, col {col} is outside 0..{num_classes}")]
    LabelOutOfRange {
        row: usize,
        col: usize,
        label: u32,
        num_classes: usize,
    },
}
