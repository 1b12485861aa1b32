//! Variant derivation: center-crop-then-fit resize to each size preset's
//! target aspect ratio, encoded as JPEG quality 90 (spec §4.2 step 3).

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::domain::errors::DomainError;
use crate::domain::models::SizePreset;

const JPEG_QUALITY: u8 = 90;

/// One derived variant: its preset, encoded JPEG bytes, and actual dimensions.
pub type Variant = (SizePreset, Vec<u8>, u32, u32);

/// Decodes `bytes` and derives one JPEG-encoded variant per size preset.
/// Runs the CPU-bound decode/resize work on a blocking thread per spec
/// §5's "isolated via `spawn_blocking`" requirement — callers on the async
/// pipeline should wrap this in `tokio::task::spawn_blocking`.
pub fn derive_variants(bytes: &[u8]) -> Result<Vec<Variant>, DomainError> {
    let image = image::load_from_memory(bytes).map_err(|e| DomainError::ValidationFailed(format!("undecodable image: {e}")))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(DomainError::ValidationFailed("generated image has zero dimension".into()));
    }

    SizePreset::ALL
        .iter()
        .map(|preset| {
            let (target_w, target_h) = preset.dimensions();
            let fitted = center_crop_then_fit(&image, target_w, target_h);
            let bytes = encode_jpeg(&fitted)?;
            Ok((*preset, bytes, target_w, target_h))
        })
        .collect()
}

/// Crops the source image to the target aspect ratio around its center,
/// then resizes exactly to `(target_w, target_h)`.
fn center_crop_then_fit(image: &DynamicImage, target_w: u32, target_h: u32) -> DynamicImage {
    let (src_w, src_h) = (image.width(), image.height());
    let target_ratio = f64::from(target_w) / f64::from(target_h);
    let src_ratio = f64::from(src_w) / f64::from(src_h);

    let (crop_w, crop_h) = if src_ratio > target_ratio {
        (((f64::from(src_h) * target_ratio).round() as u32).min(src_w), src_h)
    } else {
        (src_w, ((f64::from(src_w) / target_ratio).round() as u32).min(src_h))
    };

    let x = (src_w - crop_w) / 2;
    let y = (src_h - crop_h) / 2;

    image.crop_imm(x, y, crop_w.max(1), crop_h.max(1)).resize_exact(target_w, target_h, image::imageops::FilterType::Lanczos3)
}

fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, DomainError> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
        .map_err(|e| DomainError::ValidationFailed(format!("jpeg encode failed: {e}")))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let image: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(width, height, Rgb([200, 100, 50]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image).write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn produces_one_variant_per_preset_at_exact_dimensions() {
        let variants = derive_variants(&sample_png(3000, 2000)).unwrap();
        assert_eq!(variants.len(), 5);
        for (preset, _bytes, w, h) in &variants {
            let (expected_w, expected_h) = preset.dimensions();
            assert_eq!(*w, expected_w);
            assert_eq!(*h, expected_h);
        }
    }

    #[test]
    fn variant_bytes_decode_to_exact_target_dimensions() {
        let variants = derive_variants(&sample_png(1000, 1000)).unwrap();
        for (preset, bytes, _w, _h) in &variants {
            let decoded = image::load_from_memory(bytes).unwrap();
            let (expected_w, expected_h) = preset.dimensions();
            assert_eq!(decoded.width(), expected_w);
            assert_eq!(decoded.height(), expected_h);
        }
    }

    #[test]
    fn rejects_undecodable_bytes() {
        assert!(derive_variants(b"not an image").is_err());
    }

    #[test]
    fn handles_narrow_source_image_without_zero_crop() {
        let variants = derive_variants(&sample_png(50, 4000)).unwrap();
        assert_eq!(variants.len(), 5);
    }
}
