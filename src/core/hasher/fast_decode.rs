//! Image decoding from raw bytes.
//!
//! The format is sniffed from the leading bytes, never from the file name.
//! JPEG goes through zune-jpeg, everything else through the image crate.

use super::mmap_decode::read_file_bytes;
use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Encodings with a dedicated decode path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Other,
}

impl ImageFormat {
    /// Detect the format from magic bytes
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else {
            Self::Other
        }
    }
}

/// Byte-oriented decoder that picks the fastest path per format
pub struct FastDecoder;

impl FastDecoder {
    /// Read a file (memory-mapped when large) and decode it.
    pub fn decode(path: &Path) -> Result<DynamicImage, HashError> {
        let bytes = read_file_bytes(path)?;
        Self::decode_bytes(&bytes, path)
    }

    /// Decode encoded image bytes. `path` is only used in error messages.
    ///
    /// A JPEG that zune-jpeg rejects is retried with the image crate.
    pub fn decode_bytes(bytes: &[u8], path: &Path) -> Result<DynamicImage, HashError> {
        let image = match ImageFormat::sniff(bytes) {
            ImageFormat::Jpeg => {
                Self::decode_jpeg(bytes, path).or_else(|_| Self::decode_fallback(bytes, path))?
            }
            ImageFormat::Other => Self::decode_fallback(bytes, path)?,
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(HashError::EmptyImage {
                path: path.to_path_buf(),
            });
        }

        Ok(image)
    }

    fn decode_jpeg(bytes: &[u8], path: &Path) -> Result<DynamicImage, HashError> {
        let decode_error = |reason: String| HashError::DecodeError {
            path: path.to_path_buf(),
            reason,
        };

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = decoder
            .decode()
            .map_err(|e| decode_error(format!("zune-jpeg decode failed: {:?}", e)))?;

        let info = decoder
            .info()
            .ok_or_else(|| decode_error("missing JPEG header info".to_string()))?;

        let width = info.width as u32;
        let height = info.height as u32;

        let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);

        let image = match out_colorspace {
            ColorSpace::RGB => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8),
            ColorSpace::RGBA => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgba8),
            ColorSpace::Luma => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageLuma8),
            other => {
                return Err(decode_error(format!("unsupported colorspace {:?}", other)));
            }
        };

        image.ok_or_else(|| decode_error("pixel buffer does not match dimensions".to_string()))
    }

    fn decode_fallback(bytes: &[u8], path: &Path) -> Result<DynamicImage, HashError> {
        image::load_from_memory(bytes).map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat as CodecFormat;
    use std::io::Cursor;

    fn encode(image: &DynamicImage, format: CodecFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(32, 24, |x, y| {
            Rgb([(x * 8) as u8, (y * 10) as u8, 128])
        }))
    }

    #[test]
    fn sniff_detects_jpeg_magic() {
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::sniff(&[0x89, b'P', b'N', b'G']), ImageFormat::Other);
        assert_eq!(ImageFormat::sniff(&[]), ImageFormat::Other);
    }

    #[test]
    fn decodes_jpeg_bytes() {
        let bytes = encode(&sample(), CodecFormat::Jpeg);
        let image = FastDecoder::decode_bytes(&bytes, Path::new("a.jpg")).unwrap();

        assert_eq!((image.width(), image.height()), (32, 24));
    }

    #[test]
    fn decodes_png_bytes_regardless_of_name() {
        let bytes = encode(&sample(), CodecFormat::Png);
        let image = FastDecoder::decode_bytes(&bytes, Path::new("mislabelled.jpg")).unwrap();

        assert_eq!((image.width(), image.height()), (32, 24));
    }

    #[test]
    fn truncated_jpeg_is_an_error() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        let result = FastDecoder::decode_bytes(&bytes, Path::new("broken.jpg"));

        match result {
            Err(HashError::DecodeError { path, .. }) => assert_eq!(path, Path::new("broken.jpg")),
            other => panic!("expected decode error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn decode_missing_file_is_io_error() {
        let result = FastDecoder::decode(Path::new("/nonexistent/photo.png"));
        assert!(matches!(result, Err(HashError::IoError { .. })));
    }
}
