//! Blocking image decoding.
//!
//! Decoding converts fetched bytes into an RGBA raster via the `image` crate.
//! The call blocks until the bytes are fully decoded; callers requiring
//! asynchrony wrap it themselves. There are no partial results: a decode
//! either yields a complete image with positive dimensions or fails.

use image::RgbaImage;

use crate::error::{IconError, IconResult};

/// An in-memory raster produced by decoding, flowing through the transform
/// pipeline before it becomes a [`RenderableIcon`](crate::RenderableIcon).
///
/// The raster carries a density factor alongside its pixel data: physical
/// pixels stay unscaled, and the density divides them down to the logical
/// (user-space) size. Freshly decoded images always have density 1; the
/// density-wrap transform raises it for high-density assets.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: RgbaImage,
    density: u32,
}

impl DecodedImage {
    /// Wrap an RGBA raster at density 1.
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels, density: 1 }
    }

    /// Physical width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Physical height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Scale factor between physical pixel data and logical size.
    pub fn density(&self) -> u32 {
        self.density
    }

    /// Return the image re-tagged with the given density factor.
    #[must_use]
    pub fn with_density(mut self, density: u32) -> Self {
        debug_assert!(density >= 1);
        self.density = density;
        self
    }

    /// Apply a per-pixel map to the raster, keeping dimensions and density.
    #[must_use]
    pub fn map_pixels(mut self, f: impl Fn([u8; 4]) -> [u8; 4]) -> Self {
        for pixel in self.pixels.pixels_mut() {
            pixel.0 = f(pixel.0);
        }
        self
    }

    /// Borrow the raw RGBA raster.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub(crate) fn into_parts(self) -> (RgbaImage, u32) {
        (self.pixels, self.density)
    }
}

/// Decode raw bytes into an RGBA raster.
///
/// `identifier` is the candidate resource name, used only for error context.
/// A decode that succeeds with zero width or height is malformed and reported
/// as [`IconError::Decode`], never as success.
pub fn decode(identifier: &str, bytes: &[u8]) -> IconResult<DecodedImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| IconError::decode(identifier, e.to_string()))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(IconError::decode(
            identifier,
            format!("decoded image has invalid dimensions {}x{}", img.width(), img.height()),
        ));
    }

    Ok(DecodedImage::from_rgba(img.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_valid_png() {
        let image = decode("icons/save.png", &png_bytes(16, 16)).unwrap();
        assert_eq!(image.width(), 16);
        assert_eq!(image.height(), 16);
        assert_eq!(image.density(), 1);
    }

    #[test]
    fn test_decode_corrupt_bytes() {
        let err = decode("icons/save.png", b"definitely not an image").unwrap_err();
        match err {
            IconError::Decode { identifier, .. } => assert_eq!(identifier, "icons/save.png"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_zero_dimension_image_is_error() {
        // Minimal farbfeld image: magic followed by 0x0 big-endian dimensions.
        // Decodes cleanly but has no pixels, so the dimension guard rejects it.
        let mut bytes = b"farbfeld".to_vec();
        bytes.extend_from_slice(&[0u8; 8]);

        let err = decode("icons/degenerate.ff", &bytes).unwrap_err();
        assert!(matches!(err, IconError::Decode { .. }));
    }

    #[test]
    fn test_decode_truncated_png() {
        let mut bytes = png_bytes(16, 16);
        bytes.truncate(bytes.len() / 2);
        assert!(decode("icons/save.png", &bytes).is_err());
    }

    #[test]
    fn test_map_pixels_preserves_dimensions() {
        let image = decode("x.png", &png_bytes(4, 6)).unwrap();
        let inverted = image.map_pixels(|[r, g, b, a]| [255 - r, 255 - g, 255 - b, a]);
        assert_eq!(inverted.width(), 4);
        assert_eq!(inverted.height(), 6);
        assert_eq!(inverted.pixels().get_pixel(0, 0).0, [245, 235, 225, 255]);
    }
}
