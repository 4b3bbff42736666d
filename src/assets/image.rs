//! File-backed image source and normalization to the canvas size.

use std::path::Path;

use image::imageops::FilterType;

use crate::foundation::core::{FrameRgb, FrameSize};
use crate::foundation::error::{MorphError, MorphResult};

/// Image source resolver: turns an opaque reference into a fixed-size raster.
///
/// Both sources of a job are normalized to one base [`FrameSize`] before
/// correspondence detection. Acquisition details (remote fetch, format
/// fallbacks) live behind this seam.
pub trait ImageSource: Send + Sync {
    /// Load `reference` and normalize it to `size`.
    fn load(&self, reference: &str, size: FrameSize) -> MorphResult<FrameRgb>;
}

/// Resolver for local file paths, decoding through the `image` crate and
/// resizing with Lanczos3.
pub struct FileImageSource;

impl ImageSource for FileImageSource {
    fn load(&self, reference: &str, size: FrameSize) -> MorphResult<FrameRgb> {
        let path = Path::new(reference);
        if !path.is_file() {
            return Err(MorphError::load(format!(
                "image '{reference}' does not exist or is not a file"
            )));
        }

        let decoded = image::open(path)
            .map_err(|e| MorphError::load(format!("failed to decode image '{reference}': {e}")))?
            .into_rgb8();
        let resized =
            image::imageops::resize(&decoded, size.width, size.height, FilterType::Lanczos3);
        FrameRgb::from_raw(size, resized.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_names_the_reference() {
        let err = FileImageSource
            .load("/definitely/not/here.png", FrameSize::new(8, 8).unwrap())
            .unwrap_err();
        assert!(matches!(err, MorphError::Load(_)));
        assert!(err.to_string().contains("/definitely/not/here.png"));
    }

    #[test]
    fn decodes_and_normalizes_to_base_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        let img = image::RgbImage::from_fn(10, 6, |x, _| image::Rgb([x as u8 * 20, 0, 0]));
        img.save(&path).unwrap();

        let frame = FileImageSource
            .load(path.to_str().unwrap(), FrameSize::new(4, 4).unwrap())
            .unwrap();
        assert_eq!((frame.width, frame.height), (4, 4));
        assert_eq!(frame.data.len(), 4 * 4 * 3);
    }
}
