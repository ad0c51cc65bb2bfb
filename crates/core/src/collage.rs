//! Collage layout: tiling N images onto one canvas.
//!
//! Supporting utility next to [`crate::compose`] — collages are built
//! from already-generated images (e.g. the character, background, and
//! composed scene of a run) for preview purposes.

use image::{imageops, DynamicImage, Rgba, RgbaImage};

use crate::compose::resize_to_cover;
use crate::error::CoreError;

/// Edge length of the square thumbnails each input is normalized to.
pub const THUMB_SIZE: u32 = 300;

/// How input images are arranged on the collage canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollageLayout {
    /// 2 columns for up to 4 images, 3 columns beyond that.
    Grid,
    /// A single row, images side by side.
    Horizontal,
}

/// Number of grid columns for `count` images.
fn grid_columns(count: usize) -> u32 {
    if count <= 4 {
        2
    } else {
        3
    }
}

/// Tile the given images onto a white canvas.
///
/// Every input is first resized (cover + center-crop) to a
/// [`THUMB_SIZE`] square. An empty input slice is a validation error.
pub fn create_collage(
    images: &[DynamicImage],
    layout: CollageLayout,
) -> Result<RgbaImage, CoreError> {
    if images.is_empty() {
        return Err(CoreError::Validation("No images provided".to_string()));
    }

    let thumbnails: Vec<RgbaImage> = images
        .iter()
        .map(|img| resize_to_cover(img, (THUMB_SIZE, THUMB_SIZE)))
        .collect();

    let (cols, rows) = match layout {
        CollageLayout::Grid => {
            let cols = grid_columns(images.len());
            let rows = (images.len() as u32).div_ceil(cols);
            (cols, rows)
        }
        CollageLayout::Horizontal => (images.len() as u32, 1),
    };

    let mut canvas = RgbaImage::from_pixel(
        cols * THUMB_SIZE,
        rows * THUMB_SIZE,
        Rgba([255, 255, 255, 255]),
    );

    for (i, thumb) in thumbnails.iter().enumerate() {
        let col = i as u32 % cols;
        let row = i as u32 / cols;
        imageops::replace(
            &mut canvas,
            thumb,
            (col * THUMB_SIZE) as i64,
            (row * THUMB_SIZE) as i64,
        );
    }

    Ok(canvas)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn img(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([10, 20, 30]),
        ))
    }

    #[test]
    fn collage_rejects_empty_input() {
        assert!(create_collage(&[], CollageLayout::Grid).is_err());
    }

    #[test]
    fn grid_of_three_is_two_by_two() {
        let images = vec![img(100, 100), img(200, 100), img(100, 200)];
        let collage = create_collage(&images, CollageLayout::Grid).unwrap();
        assert_eq!((collage.width(), collage.height()), (600, 600));
    }

    #[test]
    fn grid_of_five_uses_three_columns() {
        let images = vec![img(64, 64); 5];
        let collage = create_collage(&images, CollageLayout::Grid).unwrap();
        assert_eq!((collage.width(), collage.height()), (900, 600));
    }

    #[test]
    fn horizontal_is_single_row() {
        let images = vec![img(64, 64); 3];
        let collage = create_collage(&images, CollageLayout::Horizontal).unwrap();
        assert_eq!((collage.width(), collage.height()), (900, 300));
    }

    #[test]
    fn unfilled_grid_cells_stay_white() {
        let images = vec![img(64, 64); 3];
        let collage = create_collage(&images, CollageLayout::Grid).unwrap();
        // Fourth cell (bottom-right) of the 2x2 grid is empty.
        let px = collage.get_pixel(450, 450);
        assert_eq!(px.0, [255, 255, 255, 255]);
    }
}
