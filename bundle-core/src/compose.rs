//! Image composition
//!
//! Builds the normalized bundle image: trim the source to its content
//! bounding box, tile N copies edge-to-edge, scale the merged strip to fit
//! the canvas, and center it on a fresh 1000×1000 white canvas.
//!
//! Only multiplicities 2 and 3 are ever composited; the orchestrator passes
//! other bundle sizes through untouched.

use crate::config::{Layout, TrimMode};
use crate::error::Result;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Final canvas edge length in pixels
pub const CANVAS_SIZE: u32 = 1000;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Decode fetched image bytes into an RGB buffer.
pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Encode an RGB buffer as JPEG bytes.
pub fn encode_jpeg(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Jpeg)?;
    Ok(buffer.into_inner())
}

/// Compose `multiplicity` copies of `image` onto the fixed canvas.
pub fn compose(
    image: &RgbImage,
    multiplicity: u32,
    layout: Layout,
    trim_mode: TrimMode,
) -> RgbImage {
    let trimmed = trim(image, trim_mode);
    let merged = tile(&trimmed, multiplicity, layout);
    let resized = scale_to_fit(&merged);

    debug!(
        trimmed_w = trimmed.width(),
        trimmed_h = trimmed.height(),
        merged_w = merged.width(),
        merged_h = merged.height(),
        resized_w = resized.width(),
        resized_h = resized.height(),
        "Composed bundle image"
    );

    center_on_canvas(&resized)
}

/// Crop to the bounding box of pixels differing from the reference
/// background plane. A solid-color image comes back unmodified.
pub fn trim(img: &RgbImage, mode: TrimMode) -> RgbImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let background = match mode {
        TrimMode::White => WHITE,
        TrimMode::CornerPixel => *img.get_pixel(0, 0),
    };

    match content_bbox(img, background) {
        Some((x, y, w, h)) => imageops::crop_imm(img, x, y, w, h).to_image(),
        None => img.clone(),
    }
}

/// Bounding box of pixels that differ from `background`, as (x, y, w, h).
fn content_bbox(img: &RgbImage, background: Rgb<u8>) -> Option<(u32, u32, u32, u32)> {
    let (width, height) = img.dimensions();
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for (x, y, pixel) in img.enumerate_pixels() {
        if *pixel != background {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    found.then(|| (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Place `multiplicity` copies edge-to-edge.
fn tile(img: &RgbImage, multiplicity: u32, layout: Layout) -> RgbImage {
    let (w, h) = img.dimensions();
    let vertical = match layout {
        Layout::Horizontal => false,
        Layout::Vertical => true,
        // Tie goes to horizontal.
        Layout::Automatic => h > w,
    };

    let (merged_w, merged_h) = if vertical {
        (w, h * multiplicity)
    } else {
        (w * multiplicity, h)
    };

    let mut merged = RgbImage::from_pixel(merged_w.max(1), merged_h.max(1), WHITE);
    for i in 0..multiplicity {
        let (x, y) = if vertical {
            (0i64, (i * h) as i64)
        } else {
            ((i * w) as i64, 0i64)
        };
        imageops::overlay(&mut merged, img, x, y);
    }
    merged
}

/// Uniform scale so neither dimension exceeds the canvas, preserving
/// aspect ratio. Small images scale up to fill.
fn scale_to_fit(img: &RgbImage) -> RgbImage {
    let (w, h) = img.dimensions();
    let scale = f64::min(
        CANVAS_SIZE as f64 / w as f64,
        CANVAS_SIZE as f64 / h as f64,
    );
    let new_w = ((w as f64 * scale) as u32).clamp(1, CANVAS_SIZE);
    let new_h = ((h as f64 * scale) as u32).clamp(1, CANVAS_SIZE);
    imageops::resize(img, new_w, new_h, FilterType::Lanczos3)
}

/// Paste onto a fresh white canvas, centered with floor-rounded offsets.
fn center_on_canvas(img: &RgbImage) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, WHITE);
    let (w, h) = img.dimensions();
    let x = ((CANVAS_SIZE - w) / 2) as i64;
    let y = ((CANVAS_SIZE - h) / 2) as i64;
    imageops::overlay(&mut canvas, img, x, y);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb<u8> = Rgb([200, 20, 20]);
    const BLUE: Rgb<u8> = Rgb([20, 20, 200]);

    /// White field with a red rectangle at (10, 5) .. (29, 14)
    fn framed_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(100, 60, WHITE);
        for y in 5..15 {
            for x in 10..30 {
                img.put_pixel(x, y, RED);
            }
        }
        img
    }

    #[test]
    fn test_trim_crops_to_content() {
        let trimmed = trim(&framed_image(), TrimMode::White);
        assert_eq!(trimmed.dimensions(), (20, 10));
        assert_eq!(*trimmed.get_pixel(0, 0), RED);
    }

    #[test]
    fn test_trim_is_idempotent() {
        let once = trim(&framed_image(), TrimMode::White);
        let twice = trim(&once, TrimMode::White);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_trim_solid_color_unmodified() {
        let solid = RgbImage::from_pixel(8, 8, WHITE);
        assert_eq!(trim(&solid, TrimMode::White), solid);

        let solid_red = RgbImage::from_pixel(8, 8, RED);
        assert_eq!(trim(&solid_red, TrimMode::CornerPixel), solid_red);
    }

    #[test]
    fn test_trim_corner_pixel_mode() {
        // Red background with a blue mark; white-mode trimming would keep
        // the whole frame, corner-pixel mode crops to the mark.
        let mut img = RgbImage::from_pixel(40, 40, RED);
        img.put_pixel(20, 20, BLUE);
        img.put_pixel(21, 20, BLUE);

        assert_eq!(trim(&img, TrimMode::White).dimensions(), (40, 40));
        assert_eq!(trim(&img, TrimMode::CornerPixel).dimensions(), (2, 1));
    }

    #[test]
    fn test_tile_dimensions() {
        let img = RgbImage::from_pixel(20, 10, BLUE);
        assert_eq!(tile(&img, 2, Layout::Horizontal).dimensions(), (40, 10));
        assert_eq!(tile(&img, 3, Layout::Horizontal).dimensions(), (60, 10));
        assert_eq!(tile(&img, 2, Layout::Vertical).dimensions(), (20, 20));
        assert_eq!(tile(&img, 3, Layout::Vertical).dimensions(), (20, 30));
    }

    #[test]
    fn test_automatic_layout_choice() {
        let wide = RgbImage::from_pixel(20, 10, BLUE);
        assert_eq!(tile(&wide, 2, Layout::Automatic).dimensions(), (40, 10));

        let tall = RgbImage::from_pixel(10, 20, BLUE);
        assert_eq!(tile(&tall, 2, Layout::Automatic).dimensions(), (10, 40));

        // Tie goes to horizontal.
        let square = RgbImage::from_pixel(10, 10, BLUE);
        assert_eq!(tile(&square, 2, Layout::Automatic).dimensions(), (20, 10));
    }

    #[test]
    fn test_tile_places_each_copy() {
        let mut img = RgbImage::from_pixel(4, 4, BLUE);
        img.put_pixel(0, 0, RED);
        let merged = tile(&img, 3, Layout::Horizontal);
        // The marker pixel repeats at each copy origin.
        assert_eq!(*merged.get_pixel(0, 0), RED);
        assert_eq!(*merged.get_pixel(4, 0), RED);
        assert_eq!(*merged.get_pixel(8, 0), RED);
        assert_eq!(*merged.get_pixel(1, 0), BLUE);
    }

    #[test]
    fn test_scale_to_fit_bounds() {
        let wide = RgbImage::from_pixel(2000, 500, BLUE);
        assert_eq!(scale_to_fit(&wide).dimensions(), (1000, 250));

        let small = RgbImage::from_pixel(10, 10, BLUE);
        assert_eq!(scale_to_fit(&small).dimensions(), (1000, 1000));

        let tall = RgbImage::from_pixel(100, 400, BLUE);
        assert_eq!(scale_to_fit(&tall).dimensions(), (250, 1000));
    }

    #[test]
    fn test_center_offsets_floor_rounded() {
        let img = RgbImage::from_pixel(5, 4, BLUE);
        let canvas = center_on_canvas(&img);
        assert_eq!(canvas.dimensions(), (CANVAS_SIZE, CANVAS_SIZE));
        // Offsets (1000-5)/2 = 497 and (1000-4)/2 = 498, floor-rounded.
        assert_eq!(*canvas.get_pixel(497, 498), BLUE);
        assert_eq!(*canvas.get_pixel(496, 498), WHITE);
        assert_eq!(*canvas.get_pixel(501, 501), WHITE);
    }

    #[test]
    fn test_compose_is_canvas_sized_and_centered() {
        let canvas = compose(&framed_image(), 2, Layout::Horizontal, TrimMode::White);
        assert_eq!(canvas.dimensions(), (CANVAS_SIZE, CANVAS_SIZE));
        // Trimmed 20x10, merged 40x10, scaled ×25 to 1000x250, centered.
        assert_eq!(*canvas.get_pixel(0, 0), WHITE);
        assert_eq!(*canvas.get_pixel(500, 10), WHITE);
        let middle = *canvas.get_pixel(500, 500);
        assert!(middle.0[0] > 150 && middle.0[1] < 80, "expected red content in the middle, got {:?}", middle);
    }

    #[test]
    fn test_encode_decode_roundtrip_dimensions() {
        let img = RgbImage::from_pixel(8, 6, BLUE);
        let bytes = encode_jpeg(&img).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (8, 6));
    }
}
