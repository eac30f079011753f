//! SIMD-accelerated grayscale resizing.
//!
//! Uses fast_image_resize, which picks AVX2/NEON kernels at runtime.

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::GrayImage;

/// Reusable bilinear resizer for 8-bit grayscale buffers
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Resize a grayscale buffer to exactly `width` x `height`.
    ///
    /// Returns a copy when the size already matches.
    pub fn resize_gray(
        &mut self,
        gray: &GrayImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, HashError> {
        let (src_width, src_height) = gray.dimensions();

        if src_width == 0 || src_height == 0 {
            return Err(HashError::ComputationFailed(
                "cannot resize an empty image".to_string(),
            ));
        }

        if width == 0 || height == 0 {
            return Err(HashError::ComputationFailed(format!(
                "invalid target size {}x{}",
                width, height
            )));
        }

        if (src_width, src_height) == (width, height) {
            return Ok(gray.clone());
        }

        let src_image = Image::from_vec_u8(src_width, src_height, gray.as_raw().clone(), PixelType::U8)
            .map_err(|e| HashError::ComputationFailed(format!("invalid source buffer: {}", e)))?;

        let mut dst_image = Image::new(width, height, PixelType::U8);

        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| HashError::ComputationFailed(format!("resize failed: {}", e)))?;

        GrayImage::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| {
            HashError::ComputationFailed("resized buffer does not match dimensions".to_string())
        })
    }

    /// Shrink to at most `max_width` columns, keeping the aspect ratio.
    ///
    /// Images already narrow enough are returned unchanged.
    pub fn fit_width(&mut self, gray: &GrayImage, max_width: u32) -> Result<GrayImage, HashError> {
        let (width, height) = gray.dimensions();
        if width <= max_width || max_width == 0 {
            return Ok(gray.clone());
        }

        let scaled_height = ((height as f64 * max_width as f64 / width as f64).round() as u32).max(1);
        self.resize_gray(gray, max_width, scaled_height)
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}
