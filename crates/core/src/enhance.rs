//! Post-generation image enhancement.
//!
//! Mild multiplicative adjustments applied to generated images before
//! persistence. Not on the composition critical path.

use image::{imageops, DynamicImage, RgbaImage};

/// Contrast boost applied by `Contrast` and `Auto` (+20%).
const CONTRAST_BOOST_PCT: f32 = 20.0;
/// Saturation multiplier applied by `Color` and `Auto` (+10%).
const SATURATION_FACTOR: f32 = 1.1;
/// Unsharp-mask parameters for `Sharpness` and `Auto`.
const SHARPEN_SIGMA: f32 = 1.0;
const SHARPEN_THRESHOLD: i32 = 2;

/// Which adjustment to apply. `Auto` applies all of them in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancementKind {
    Auto,
    Contrast,
    Color,
    Sharpness,
}

/// Apply the selected enhancement and return the adjusted image.
pub fn enhance_image(image: &DynamicImage, kind: EnhancementKind) -> RgbaImage {
    let mut enhanced = image.to_rgba8();

    if matches!(kind, EnhancementKind::Auto | EnhancementKind::Contrast) {
        enhanced = imageops::contrast(&enhanced, CONTRAST_BOOST_PCT);
    }

    if matches!(kind, EnhancementKind::Auto | EnhancementKind::Color) {
        saturate(&mut enhanced, SATURATION_FACTOR);
    }

    if matches!(kind, EnhancementKind::Auto | EnhancementKind::Sharpness) {
        enhanced = imageops::unsharpen(&enhanced, SHARPEN_SIGMA, SHARPEN_THRESHOLD);
    }

    enhanced
}

/// Scale each pixel's chroma away from its luma by `factor`.
///
/// `factor` 1.0 is a no-op, above 1.0 increases saturation. Alpha is
/// untouched.
fn saturate(image: &mut RgbaImage, factor: f32) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        for channel in pixel.0.iter_mut().take(3) {
            let adjusted = luma + (*channel as f32 - luma) * factor;
            *channel = adjusted.clamp(0.0, 255.0) as u8;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
