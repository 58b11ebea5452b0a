use image::RgbImage;

use crate::decode::ColorImage;
use crate::error::DecodeError;

/// Default mask opacity for overlays.
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Alpha-blends a decoded mask over the source image.
///
/// Every channel becomes `round(base * (1 - alpha) + mask * alpha)`.
pub fn blend(base: &RgbImage, mask: &ColorImage, alpha: f32) -> Result<RgbImage, DecodeError> {
    validate_alpha(alpha)?;
    if base.dimensions() != (mask.width(), mask.height()) {
        return Err(DecodeError::Shape(format!(
            "mask is {}x{} but image is {}x{}",
            mask.width(),
            mask.height(),
            base.width(),
            base.height()
        )));
    }

    let mut out = base.clone();
    for (dst, src) in out.pixels_mut().zip(mask.as_rgb_image().pixels()) {
        for (d, s) in dst.0.iter_mut().zip(src.0) {
            let mixed = f32::from(*d) * (1.0 - alpha) + f32::from(s) * alpha;
            *d = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(out)
}

pub fn validate_alpha(alpha: f32) -> Result<(), DecodeError> {
    if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
        return Err(DecodeError::Configuration(format!(
            "overlay alpha must be within [0, 1], got {}",
            alpha
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::label_map::LabelMap;
    use crate::palette::ClassPalette;

    fn sky_mask() -> ColorImage {
        let labels = LabelMap::from_rows(&[[5u32, 0]]).unwrap();
        decode(&labels, 8, &ClassPalette::default()).unwrap()
    }

    #[test]
    fn blends_half_and_half() {
        let base = RgbImage::from_pixel(2, 1, image::Rgb([200, 100, 0]));
        let out = blend(&base, &sky_mask(), 0.5).unwrap();
        // sky is (70, 130, 180); void is black
        assert_eq!(out.get_pixel(0, 0).0, [135, 115, 90]);
        assert_eq!(out.get_pixel(1, 0).0, [100, 50, 0]);
    }

    #[test]
    fn alpha_extremes_select_one_side() {
        let base = RgbImage::from_pixel(2, 1, image::Rgb([9, 9, 9]));
        assert_eq!(blend(&base, &sky_mask(), 0.0).unwrap(), base);
        assert_eq!(
            blend(&base, &sky_mask(), 1.0).unwrap(),
            sky_mask().into_rgb_image()
        );
    }

    #[test]
    fn rejects_bad_alpha_and_mismatched_sizes() {
        let base = RgbImage::new(2, 1);
        assert!(matches!(
            blend(&base, &sky_mask(), 1.5),
            Err(DecodeError::Configuration(_))
        ));
        assert!(matches!(
            blend(&base, &sky_mask(), f32::NAN),
            Err(DecodeError::Configuration(_))
        ));
        assert!(matches!(
            blend(&RgbImage::new(3, 3), &sky_mask(), 0.5),
            Err(DecodeError::Shape(_))
        ));
    }
}
