//! BT.601 luma, the weighting OpenCV applies when it loads or converts an
//! image to grayscale.

use image::{DynamicImage, GrayImage, Luma};

/// 14-bit fixed-point weights for R, G and B; they sum to `1 << SHIFT`.
const WEIGHTS: [u32; 3] = [4899, 9617, 1868];
const SHIFT: u32 = 14;

/// Grayscale with Y = 0.299 R + 0.587 G + 0.114 B, rounded.
///
/// Alpha is dropped, not blended.
pub fn luma_bt601(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }

    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let weighted = WEIGHTS[0] * r as u32 + WEIGHTS[1] * g as u32 + WEIGHTS[2] * b as u32;
        Luma([((weighted + (1 << (SHIFT - 1))) >> SHIFT) as u8])
    })
}
