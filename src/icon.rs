//! Display-ready icons.
//!
//! A [`RenderableIcon`] is the final value handed to callers: an immutable
//! RGBA raster plus the logical size it should occupy on screen. Painting
//! goes through the [`PaintSurface`] trait so the cache core stays decoupled
//! from any particular windowing or rendering backend.
//!
//! # Example
//!
//! ```ignore
//! let icon = registry.lookup("icons/save.png");
//! println!("{}x{} logical pixels", icon.width(), icon.height());
//! icon.paint(&mut surface, 4, 4);
//! ```

use std::sync::{Arc, OnceLock};

use crate::decode::DecodedImage;
use crate::transform::{ColorFilter, GrayscaleFilter, OpacityFilter};

/// An opaque drawing-surface handle icons paint onto.
///
/// The surface receives the physical pixel data together with the logical
/// placement rectangle; density-aware backends draw the physical pixels into
/// the logical rectangle, standard backends can blit 1:1 since the two sizes
/// coincide for density-1 icons.
pub trait PaintSurface {
    /// Blit an RGBA raster with its top-left corner at logical `(x, y)`.
    ///
    /// `pixels` holds `physical_width * physical_height * 4` bytes in
    /// row-major RGBA order; the raster should occupy
    /// `logical_width x logical_height` user-space pixels.
    #[allow(clippy::too_many_arguments)]
    fn blit_rgba(
        &mut self,
        x: i32,
        y: i32,
        logical_width: u32,
        logical_height: u32,
        physical_width: u32,
        physical_height: u32,
        pixels: &[u8],
    );
}

/// A decoded, transformed icon ready for display.
///
/// Immutable once produced. Lookups return icons behind `Arc`, so a returned
/// handle stays valid even if the cache later reclaims or recomputes the
/// entry it came from. It is a snapshot immune to flag changes.
pub struct RenderableIcon {
    pixels: Vec<u8>,
    physical_width: u32,
    physical_height: u32,
    density: u32,
}

impl RenderableIcon {
    pub(crate) fn from_decoded(image: DecodedImage) -> Self {
        let (pixels, density) = image.into_parts();
        let (physical_width, physical_height) = pixels.dimensions();
        Self {
            pixels: pixels.into_raw(),
            physical_width,
            physical_height,
            density,
        }
    }

    /// The shared zero-size placeholder returned when resolution fails in
    /// non-strict mode. Painting it draws nothing.
    pub fn empty() -> Arc<RenderableIcon> {
        static EMPTY: OnceLock<Arc<RenderableIcon>> = OnceLock::new();
        EMPTY
            .get_or_init(|| {
                Arc::new(RenderableIcon {
                    pixels: Vec::new(),
                    physical_width: 0,
                    physical_height: 0,
                    density: 1,
                })
            })
            .clone()
    }

    /// Logical width in user-space pixels.
    pub fn width(&self) -> u32 {
        self.physical_width / self.density
    }

    /// Logical height in user-space pixels.
    pub fn height(&self) -> u32 {
        self.physical_height / self.density
    }

    /// Width of the underlying pixel data.
    pub fn physical_width(&self) -> u32 {
        self.physical_width
    }

    /// Height of the underlying pixel data.
    pub fn physical_height(&self) -> u32 {
        self.physical_height
    }

    /// Scale factor between physical pixel data and logical size.
    pub fn density(&self) -> u32 {
        self.density
    }

    /// True for the zero-size placeholder.
    pub fn is_empty(&self) -> bool {
        self.physical_width == 0 || self.physical_height == 0
    }

    /// The raw RGBA pixel data, row-major, 4 bytes per pixel.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Approximate memory held by this icon's raster.
    pub(crate) fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Paint this icon with its top-left corner at logical `(x, y)`.
    pub fn paint(&self, surface: &mut dyn PaintSurface, x: i32, y: i32) {
        if self.is_empty() {
            return;
        }
        surface.blit_rgba(
            x,
            y,
            self.width(),
            self.height(),
            self.physical_width,
            self.physical_height,
            &self.pixels,
        );
    }

    /// A desaturated copy of this icon for disabled-state rendering.
    pub fn disabled(&self) -> RenderableIcon {
        self.filtered(&GrayscaleFilter)
    }

    /// A copy of this icon with its alpha channel multiplied by `alpha`.
    pub fn with_alpha(&self, alpha: f32) -> RenderableIcon {
        self.filtered(&OpacityFilter::new(alpha))
    }

    fn filtered(&self, filter: &dyn ColorFilter) -> RenderableIcon {
        let mut pixels = self.pixels.clone();
        for rgba in pixels.chunks_exact_mut(4) {
            let out = filter.filter_pixel([rgba[0], rgba[1], rgba[2], rgba[3]]);
            rgba.copy_from_slice(&out);
        }
        RenderableIcon {
            pixels,
            physical_width: self.physical_width,
            physical_height: self.physical_height,
            density: self.density,
        }
    }
}

impl std::fmt::Debug for RenderableIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderableIcon")
            .field("logical", &format!("{}x{}", self.width(), self.height()))
            .field(
                "physical",
                &format!("{}x{}", self.physical_width, self.physical_height),
            )
            .field("density", &self.density)
            .finish()
    }
}
