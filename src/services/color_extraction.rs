//! Dominant color extraction (spec §4.2 step 5's "extracted dominant
//! colors"). Quantizes pixels into a coarse RGB histogram rather than
//! running a full clustering pass — cheap enough to run inline with the
//! tagging step instead of its own adapter.

use image::DynamicImage;

use crate::domain::errors::DomainError;
use crate::domain::models::Color;
use uuid::Uuid;

/// Buckets per channel; 4 bits of each of R/G/B gives 4096 buckets, fine
/// enough to separate dominant colors without being fooled by JPEG noise.
const BUCKET_SHIFT: u8 = 4;

const MAX_COLORS: usize = 5;

/// Decodes `bytes` and returns up to [`MAX_COLORS`] colors ordered by
/// descending pixel share, the first marked dominant.
pub fn extract_colors(image_id: Uuid, bytes: &[u8]) -> Result<Vec<Color>, DomainError> {
    let image = image::load_from_memory(bytes).map_err(|e| DomainError::ValidationFailed(format!("undecodable image: {e}")))?;
    let histogram = bucket_histogram(&image);
    let total_pixels: u64 = histogram.values().sum();
    if total_pixels == 0 {
        return Err(DomainError::ValidationFailed("image has no pixels".into()));
    }

    let mut buckets: Vec<(u32, u64)> = histogram.into_iter().collect();
    buckets.sort_by_key(|b| std::cmp::Reverse(b.1));

    Ok(buckets
        .into_iter()
        .take(MAX_COLORS)
        .enumerate()
        .map(|(i, (bucket, count))| Color {
            image_id,
            hex: bucket_to_hex(bucket),
            percentage: (count as f32 / total_pixels as f32) * 100.0,
            is_dominant: i == 0,
        })
        .collect())
}

fn bucket_histogram(image: &DynamicImage) -> std::collections::HashMap<u32, u64> {
    let rgb = image.to_rgb8();
    let mut histogram = std::collections::HashMap::new();
    for pixel in rgb.pixels() {
        let [r, g, b] = pixel.0;
        let bucket = (u32::from(r >> BUCKET_SHIFT) << 16) | (u32::from(g >> BUCKET_SHIFT) << 8) | u32::from(b >> BUCKET_SHIFT);
        *histogram.entry(bucket).or_insert(0u64) += 1;
    }
    histogram
}

fn bucket_to_hex(bucket: u32) -> String {
    let r = ((bucket >> 16) & 0xFF) as u8;
    let g = ((bucket >> 8) & 0xFF) as u8;
    let b = (bucket & 0xFF) as u8;
    let (r, g, b) = (r << BUCKET_SHIFT, g << BUCKET_SHIFT, b << BUCKET_SHIFT);
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid_png(rgb: [u8; 3]) -> Vec<u8> {
        let image: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(32, 32, Rgb(rgb));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image).write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn solid_color_image_yields_single_dominant_color_at_full_share() {
        let colors = extract_colors(Uuid::new_v4(), &solid_png([200, 10, 10])).unwrap();
        assert_eq!(colors.len(), 1);
        assert!(colors[0].is_dominant);
        assert!((colors[0].percentage - 100.0).abs() < 0.01);
    }

    #[test]
    fn rejects_undecodable_bytes() {
        assert!(extract_colors(Uuid::new_v4(), b"not an image").is_err());
    }
}
