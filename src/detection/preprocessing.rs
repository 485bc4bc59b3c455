use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::filter::separable_filter_equal;
use imageproc::map::map_colors;

use crate::models::ScaledBox;

/// 5-tap binomial weights used for a 5x5 Gaussian when no sigma is given
pub const BLUR_KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

// ITU-R BT.601 luma weights in 14-bit fixed point; they sum to 1 << 14
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Cut the box out of the image. Returns `None` when nothing is left after
/// clamping the box to the image bounds.
pub fn crop(img: &RgbImage, bbox: &ScaledBox) -> Option<RgbImage> {
    let (width, height) = img.dimensions();
    let x1 = bbox.x1().min(width);
    let y1 = bbox.y1().min(height);
    let x2 = bbox.x2().min(width);
    let y2 = bbox.y2().min(height);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(image::imageops::crop_imm(img, x1, y1, x2 - x1, y2 - y1).to_image())
}

/// Convert image to grayscale with BT.601 weights (0.299 R + 0.587 G + 0.114 B)
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    map_colors(img, |Rgb([r, g, b])| {
        let luma = r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B;
        Luma([((luma + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8])
    })
}

/// Mirror an out-of-range index back into `0..len` without repeating the edge
/// pixel (`dcb|abcd|cba`)
fn reflect_101(index: i64, len: u32) -> u32 {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let i = index.rem_euclid(period);
    (if i >= len { period - i } else { i }) as u32
}

/// Gaussian smoothing with a fixed 5x5 kernel, applied separably.
/// Borders are reflected without duplicating the edge row or column.
pub fn apply_blur(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let pad = (BLUR_KERNEL.len() / 2) as u32;
    let padded = GrayImage::from_fn(width + 2 * pad, height + 2 * pad, |x, y| {
        let sx = reflect_101(x as i64 - pad as i64, width);
        let sy = reflect_101(y as i64 - pad as i64, height);
        *img.get_pixel(sx, sy)
    });
    let blurred = separable_filter_equal::<Luma<u8>, f32>(&padded, &BLUR_KERNEL);
    image::imageops::crop_imm(&blurred, pad, pad, width, height).to_image()
}

/// Global threshold at the Otsu level; output pixels are 0 or 255
pub fn otsu_binarize(img: &GrayImage) -> GrayImage {
    let level = otsu_level(img);
    threshold(img, level, ThresholdType::Binary)
}

/// Crop, grayscale, blur and binarize one region for the recognizer.
/// The order of the stages is fixed.
pub fn process(img: &RgbImage, bbox: &ScaledBox) -> Option<GrayImage> {
    let region = crop(img, bbox)?;
    let gray = to_grayscale(&region);
    let blurred = apply_blur(&gray);
    Some(otsu_binarize(&blurred))
}
