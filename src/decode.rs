//! Label map -> color image decoding.
//!
//! Each pixel takes the palette color of its class. Labels outside
//! `0..num_classes` fall back to the void color in lenient mode, which keeps
//! stray predictions displayable. Strict mode reports them instead.

use image::{Rgb as ImageRgb, RgbImage};

use crate::error::DecodeError;
use crate::label_map::LabelMap;
use crate::palette::{ClassPalette, Rgb};

/// How out-of-range labels are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Out-of-range labels become `Rgb::VOID`.
    #[default]
    Lenient,
    /// Out-of-range labels fail with `DecodeError::LabelOutOfRange`.
    Strict,
}

/// Decoded (H, W, 3) raster, 8 bits per channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorImage {
    image: RgbImage,
}

impl ColorImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Color at (row, col), if inside the image.
    pub fn pixel(&self, row: u32, col: u32) -> Option<Rgb> {
        self.image
            .get_pixel_checked(col, row)
            .map(|p| Rgb(p.0[0], p.0[1], p.0[2]))
    }

    /// Nested `[row][col][channel]` view, mostly for comparisons in tests.
    pub fn to_rows(&self) -> Vec<Vec<[u8; 3]>> {
        self.image
            .rows()
            .map(|row| row.map(|p| p.0).collect())
            .collect()
    }

    pub fn as_rgb_image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_rgb_image(self) -> RgbImage {
        self.image
    }
}

/// Decoder bound to a palette and class count.
#[derive(Clone, Debug)]
pub struct SegmentationDecoder {
    palette: ClassPalette,
    num_classes: usize,
    mode: DecodeMode,
}

impl SegmentationDecoder {
    /// Fails with `DecodeError::Configuration` when the palette holds fewer
    /// than `num_classes` entries.
    pub fn new(palette: ClassPalette, num_classes: usize) -> Result<Self, DecodeError> {
        check_class_count(num_classes, &palette)?;
        Ok(Self {
            palette,
            num_classes,
            mode: DecodeMode::Lenient,
        })
    }

    pub fn with_mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    pub fn palette(&self) -> &ClassPalette {
        &self.palette
    }

    pub fn decode(&self, labels: &LabelMap) -> Result<ColorImage, DecodeError> {
        decode_with_mode(labels, self.num_classes, &self.palette, self.mode)
    }

    /// Pixel count per class in `0..num_classes`, followed by the count of
    /// out-of-range pixels.
    pub fn class_histogram(&self, labels: &LabelMap) -> Vec<u64> {
        let mut counts = vec![0u64; self.num_classes + 1];
        for &label in labels.as_slice() {
            let slot = (label as usize).min(self.num_classes);
            counts[slot] += 1;
        }
        counts
    }
}

/// Decodes `labels` with the lenient void fallback.
pub fn decode(
    labels: &LabelMap,
    num_classes: usize,
    palette: &ClassPalette,
) -> Result<ColorImage, DecodeError> {
    decode_with_mode(labels, num_classes, palette, DecodeMode::Lenient)
}

pub fn decode_with_mode(
    labels: &LabelMap,
    num_classes: usize,
    palette: &ClassPalette,
    mode: DecodeMode,
) -> Result<ColorImage, DecodeError> {
    check_class_count(num_classes, palette)?;
    let width = dimension(labels.width())?;
    let height = dimension(labels.height())?;
    let mut image = RgbImage::new(width, height);
    if num_classes == 0 && mode == DecodeMode::Lenient {
        return Ok(ColorImage { image });
    }

    // Class count is bounded by the palette, so every in-range label has a color.
    let lut: Vec<Rgb> = palette.entries()[..num_classes]
        .iter()
        .map(|entry| entry.rgb)
        .collect();

    for (y, row) in labels.rows().enumerate() {
        for (x, &label) in row.iter().enumerate() {
            let rgb = match lut.get(label as usize) {
                Some(rgb) => *rgb,
                None if mode == DecodeMode::Strict => {
                    return Err(DecodeError::LabelOutOfRange {
                        row: y,
                        col: x,
                        label,
                        num_classes,
                    });
                }
                None => Rgb::VOID,
            };
            image.put_pixel(x as u32, y as u32, ImageRgb(rgb.channels()));
        }
    }
    Ok(ColorImage { image })
}

fn check_class_count(num_classes: usize, palette: &ClassPalette) -> Result<(), DecodeError> {
    if num_classes > palette.len() {
        return Err(DecodeError::Configuration(format!(
            "num_classes {} exceeds palette size {}",
            num_classes,
            palette.len()
        )));
    }
    Ok(())
}

fn dimension(value: usize) -> Result<u32, DecodeError> {
    u32::try_from(value)
        .map_err(|_| DecodeError::Shape(format!("dimension {} does not fit an image", value)))
}
