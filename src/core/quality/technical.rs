//! Pixel statistics used for the technical score.

use image::GrayImage;

/// Variance of the 4-neighbour Laplacian `[0 1 0; 1 -4 1; 0 1 0]`.
///
/// Every pixel contributes; neighbours outside the image are mirrored
/// without repeating the edge pixel (`dcb|abcd|cba`).
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    if width == 0 || height == 0 {
        return 0.0;
    }

    let pixels = gray.as_raw();
    let at = |x: isize, y: isize| -> f64 {
        let x = reflect101(x, width);
        let y = reflect101(y, height);
        pixels[y * width + x] as f64
    };

    let count = (width * height) as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;

    for y in 0..height as isize {
        for x in 0..width as isize {
            let response = at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4.0 * at(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}

/// Mean intensity, 0-255.
pub fn mean_brightness(gray: &GrayImage) -> f64 {
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    pixels.iter().map(|&p| p as u64).sum::<u64>() as f64 / pixels.len() as f64
}

fn reflect101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = i;
    while i < 0 || i > last {
        i = if i < 0 { -i } else { 2 * last - i };
    }
    i as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn checkerboard(size: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn reflect101_mirrors_without_edge() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(2, 5), 2);
        assert_eq!(reflect101(-1, 1), 0);
    }

    #[test]
    fn uniform_image_has_zero_variance() {
        let gray = GrayImage::from_pixel(32, 24, Luma([128]));
        assert_eq!(laplacian_variance(&gray), 0.0);
    }

    #[test]
    fn checkerboard_variance_is_exact() {
        // Every response is +-1020, borders included, and the mean is zero.
        let variance = laplacian_variance(&checkerboard(16));
        assert!((variance - 1020.0 * 1020.0).abs() < 1e-6, "got {}", variance);
    }

    #[test]
    fn sharper_edges_score_higher() {
        let soft = GrayImage::from_fn(64, 64, |x, _| Luma([(x * 4) as u8]));
        let hard = GrayImage::from_fn(64, 64, |x, _| Luma([if x < 32 { 0 } else { 255 }]));

        assert!(laplacian_variance(&hard) > laplacian_variance(&soft));
    }

    #[test]
    fn brightness_is_mean_intensity() {
        assert_eq!(mean_brightness(&GrayImage::from_pixel(8, 8, Luma([50]))), 50.0);
        assert_eq!(mean_brightness(&checkerboard(8)), 127.5);
    }
}
