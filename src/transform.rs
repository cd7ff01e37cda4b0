//! Transforms applied to each photo as its transfer completes

use crate::error::BoxError;
use crate::types::Blob;

/// Pure `blob -> blob` transform applied once per completed transfer,
/// before the blob is appended to the sink.
///
/// Failures are propagated to the caller of the multiplexer, never
/// swallowed.
pub trait BlobTransform: Send + Sync + 'static {
    /// Transform a reassembled blob
    fn apply(&self, blob: Blob) -> Result<Blob, BoxError>;
}

/// Passes blobs through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl BlobTransform for Identity {
    fn apply(&self, blob: Blob) -> Result<Blob, BoxError> {
        Ok(blob)
    }
}

impl<F> BlobTransform for F
where
    F: Fn(Blob) -> Result<Blob, BoxError> + Send + Sync + 'static,
{
    fn apply(&self, blob: Blob) -> Result<Blob, BoxError> {
        self(blob)
    }
}

#[cfg(feature = "imaging")]
pub use rotate::{Rotate, Rotation};

#[cfg(feature = "imaging")]
mod rotate {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat};
    use tracing::trace;

    use super::BlobTransform;
    use crate::error::BoxError;
    use crate::types::Blob;

    /// Clockwise quarter-turn angle
    #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub enum Rotation {
        Deg90,
        Deg180,
        Deg270,
    }

    /// Rotates JPEG photos by a fixed angle and re-encodes them as JPEG.
    ///
    /// Wearable camera sensors are usually mounted sideways; `Rotate::new(Rotation::Deg270)`
    /// brings their photos upright.
    #[derive(Debug, Clone, Copy)]
    pub struct Rotate {
        rotation: Rotation,
    }

    impl Rotate {
        pub fn new(rotation: Rotation) -> Self {
            Self { rotation }
        }

        pub fn rotation(&self) -> Rotation {
            self.rotation
        }
    }

    impl BlobTransform for Rotate {
        fn apply(&self, blob: Blob) -> Result<Blob, BoxError> {
            let decoded = image::load_from_memory_with_format(&blob, ImageFormat::Jpeg)?;
            let rotated = match self.rotation {
                Rotation::Deg90 => decoded.rotate90(),
                Rotation::Deg180 => decoded.rotate180(),
                Rotation::Deg270 => decoded.rotate270(),
            };

            // The JPEG encoder has no alpha support
            let rgb = DynamicImage::ImageRgb8(rotated.to_rgb8());
            let mut encoded = Vec::with_capacity(blob.len());
            rgb.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg)?;

            trace!(
                before = blob.len(),
                after = encoded.len(),
                rotation = ?self.rotation,
                "Rotated photo"
            );
            Ok(Blob::from(encoded))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use image::{GenericImageView, RgbImage};

        fn jpeg(width: u32, height: u32) -> Blob {
            let pixels = RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
            let image = DynamicImage::ImageRgb8(pixels);
            let mut encoded = Vec::new();
            image.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg).unwrap();
            Blob::from(encoded)
        }

        #[test]
        fn quarter_turn_swaps_dimensions() {
            let rotated = Rotate::new(Rotation::Deg270).apply(jpeg(8, 4)).unwrap();
            let decoded = image::load_from_memory_with_format(&rotated, ImageFormat::Jpeg).unwrap();
            assert_eq!(decoded.dimensions(), (4, 8));
        }

        #[test]
        fn half_turn_keeps_dimensions() {
            let rotated = Rotate::new(Rotation::Deg180).apply(jpeg(8, 4)).unwrap();
            let decoded = image::load_from_memory_with_format(&rotated, ImageFormat::Jpeg).unwrap();
            assert_eq!(decoded.dimensions(), (8, 4));
        }

        #[test]
        fn rejects_non_jpeg_payloads() {
            assert!(Rotate::new(Rotation::Deg90).apply(Blob::from(&[1u8, 2, 3][..])).is_err());
        }
    }
}
