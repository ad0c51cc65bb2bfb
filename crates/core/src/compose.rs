//! Scene composition: merging a character image onto a background.
//!
//! All geometry is normalized to a fixed 1024x768 canvas. The
//! character is resized to a fraction of the canvas, positioned via a
//! small closed-form placement table, optionally given soft edges
//! through an alpha mask, and alpha-composited onto the background.
//!
//! Inputs and outputs are in-memory rasters ([`image::DynamicImage`]
//! in, [`image::RgbaImage`] out); encoding and persistence belong to
//! the callers.

use image::imageops::FilterType;
use image::{imageops, DynamicImage, GrayImage, Luma, RgbaImage};
use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Canvas width all scenes are normalized to.
pub const CANVAS_WIDTH: u32 = 1024;
/// Canvas height all scenes are normalized to (4:3-wider aspect).
pub const CANVAS_HEIGHT: u32 = 768;

/// Character target width as a fraction of the canvas width.
pub const CHARACTER_WIDTH_FRACTION: f64 = 0.4;
/// Character height multiplier relative to its target width.
pub const CHARACTER_ASPECT_MULTIPLIER: f64 = 1.2;

/// Distance in pixels over which character edges fade to transparent.
pub const EDGE_FADE_PX: u32 = 20;
/// Gaussian blur sigma applied to smooth the fade ramp.
const MASK_BLUR_SIGMA: f32 = 2.0;

/// Vertical margin for top/bottom placements.
const VERTICAL_MARGIN_PX: i64 = 50;

// ---------------------------------------------------------------------------
// Position resolution
// ---------------------------------------------------------------------------

/// Where the character is placed on the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenePosition {
    Center,
    Left,
    Right,
    BottomCenter,
    TopCenter,
}

impl ScenePosition {
    /// Parse a position key. Unrecognized keys fall back to `Center`
    /// rather than failing.
    pub fn from_key(key: &str) -> Self {
        match key {
            "left" => Self::Left,
            "right" => Self::Right,
            "bottom_center" => Self::BottomCenter,
            "top_center" => Self::TopCenter,
            _ => Self::Center,
        }
    }

    /// The wire/key form of the position.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Left => "left",
            Self::Right => "right",
            Self::BottomCenter => "bottom_center",
            Self::TopCenter => "top_center",
        }
    }
}

/// Resolve the pixel offset of the character's top-left corner on the
/// background for a given placement.
pub fn resolve_position(
    bg_size: (u32, u32),
    char_size: (u32, u32),
    position: ScenePosition,
) -> (i64, i64) {
    let (bg_w, bg_h) = (bg_size.0 as i64, bg_size.1 as i64);
    let (char_w, char_h) = (char_size.0 as i64, char_size.1 as i64);

    match position {
        ScenePosition::Center => ((bg_w - char_w) / 2, (bg_h - char_h) / 2),
        ScenePosition::Left => (bg_w / 6, (bg_h - char_h) / 2),
        ScenePosition::Right => (bg_w - char_w - bg_w / 6, (bg_h - char_h) / 2),
        ScenePosition::BottomCenter => ((bg_w - char_w) / 2, bg_h - char_h - VERTICAL_MARGIN_PX),
        ScenePosition::TopCenter => ((bg_w - char_w) / 2, VERTICAL_MARGIN_PX),
    }
}

// ---------------------------------------------------------------------------
// Resize-to-cover
// ---------------------------------------------------------------------------

/// Resize an image to exactly `target` dimensions without distortion.
///
/// Scales uniformly so the image fully covers the target on the
/// constraining axis (matching height when the image is relatively
/// wider than the target, matching width otherwise), then center-crops
/// the overflow. The result always has exactly the requested
/// dimensions; scale is always uniform, so there is no letterboxing
/// and no stretching.
pub fn resize_to_cover(image: &DynamicImage, target: (u32, u32)) -> RgbaImage {
    let (target_w, target_h) = target;
    let img_ratio = image.width() as f64 / image.height() as f64;
    let target_ratio = target_w as f64 / target_h as f64;

    let (new_w, new_h) = if img_ratio > target_ratio {
        // Relatively wider: match the target height, overflow on x.
        let h = target_h;
        let w = ((h as f64 * img_ratio) as u32).max(target_w);
        (w, h)
    } else {
        // Relatively taller (or equal): match the target width.
        let w = target_w;
        let h = ((w as f64 / img_ratio) as u32).max(target_h);
        (w, h)
    };

    let resized = imageops::resize(&image.to_rgba8(), new_w, new_h, FilterType::Lanczos3);

    if (new_w, new_h) == (target_w, target_h) {
        return resized;
    }

    let left = (new_w - target_w) / 2;
    let top = (new_h - target_h) / 2;
    imageops::crop_imm(&resized, left, top, target_w, target_h).to_image()
}

// ---------------------------------------------------------------------------
// Soft edge mask
// ---------------------------------------------------------------------------

/// Build a single-channel opacity mask that fades from transparent at
/// the image border to fully opaque `fade` pixels inward.
///
/// The ramp is a per-pixel distance-to-edge gradient, smoothed with a
/// small gaussian blur so the transition is continuous. Applied as the
/// character's alpha channel, it melts hard cut edges into the
/// background.
pub fn soft_edge_mask(width: u32, height: u32, fade: u32) -> GrayImage {
    let mut mask = GrayImage::from_pixel(width, height, Luma([255u8]));

    if fade > 0 && width > 0 && height > 0 {
        for (x, y, pixel) in mask.enumerate_pixels_mut() {
            let to_edge = x.min(y).min(width - 1 - x).min(height - 1 - y);
            if to_edge < fade {
                *pixel = Luma([(255 * to_edge / fade) as u8]);
            }
        }
    }

    imageops::blur(&mask, MASK_BLUR_SIGMA)
}

/// Replace the alpha channel of `image` with `mask`.
///
/// Both must share dimensions; the caller guarantees this because the
/// mask is always built from the character's own size.
fn apply_alpha_mask(image: &mut RgbaImage, mask: &GrayImage) {
    for (pixel, mask_pixel) in image.pixels_mut().zip(mask.pixels()) {
        pixel.0[3] = mask_pixel.0[0];
    }
}

// ---------------------------------------------------------------------------
// Scene composition
// ---------------------------------------------------------------------------

/// Structured record of the placement decision made for a composition.
///
/// Persisted alongside the pixel data so the provenance of a composed
/// scene can be reconstructed later.
#[derive(Debug, Clone, Serialize)]
pub struct CompositionInfo {
    /// Placement key used for the character.
    pub character_position: String,
    /// Character dimensions after resizing, `(width, height)`.
    pub character_size: (u32, u32),
    /// Background dimensions after resizing, `(width, height)`.
    pub background_size: (u32, u32),
    /// Whether soft edge blending was applied.
    pub blend_edges: bool,
}

/// A composed scene. Ephemeral: owned by the caller until persisted.
pub struct CompositionResult {
    /// The composed canvas.
    pub image: RgbaImage,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Placement provenance.
    pub info: CompositionInfo,
}

/// Compose a character and a background into one scene.
///
/// Both inputs are normalized first: the background is resized to
/// cover the 1024x768 canvas, the character to 40% of the canvas
/// width with a 1.2 height multiplier. The two targets are
/// independent, so character scale never depends on the background's
/// source dimensions.
///
/// With `blend_edges` the character receives a [`soft_edge_mask`] as
/// its alpha channel and is alpha-composited (standard "over"
/// operator). Without it the paste is unweighted: the character's own
/// alpha channel is respected when the source carries one, otherwise
/// the destination region is overwritten opaquely.
pub fn compose_scene(
    character: &DynamicImage,
    background: &DynamicImage,
    position: ScenePosition,
    blend_edges: bool,
) -> Result<CompositionResult, CoreError> {
    if character.width() == 0 || character.height() == 0 {
        return Err(CoreError::Validation(
            "Character image has zero dimensions".to_string(),
        ));
    }
    if background.width() == 0 || background.height() == 0 {
        return Err(CoreError::Validation(
            "Background image has zero dimensions".to_string(),
        ));
    }

    let mut composed = resize_to_cover(background, (CANVAS_WIDTH, CANVAS_HEIGHT));

    let char_w = (CANVAS_WIDTH as f64 * CHARACTER_WIDTH_FRACTION) as u32;
    let char_h = (char_w as f64 * CHARACTER_ASPECT_MULTIPLIER) as u32;
    let mut char_resized = resize_to_cover(character, (char_w, char_h));

    let (x, y) = resolve_position(
        (CANVAS_WIDTH, CANVAS_HEIGHT),
        (char_w, char_h),
        position,
    );

    if blend_edges {
        let mask = soft_edge_mask(char_w, char_h, EDGE_FADE_PX);
        apply_alpha_mask(&mut char_resized, &mask);
        imageops::overlay(&mut composed, &char_resized, x, y);
    } else if character.color().has_alpha() {
        // Source alpha survives the RGBA conversion in resize_to_cover.
        imageops::overlay(&mut composed, &char_resized, x, y);
    } else {
        imageops::replace(&mut composed, &char_resized, x, y);
    }

    let info = CompositionInfo {
        character_position: position.as_str().to_string(),
        character_size: (char_w, char_h),
        background_size: (CANVAS_WIDTH, CANVAS_HEIGHT),
        blend_edges,
    };

    Ok(CompositionResult {
        image: composed,
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
        info,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
