//! Post-decode transform pipeline.
//!
//! After a candidate decodes successfully, the raster flows through an
//! ordered list of transforms before it is cached. Two standard stages exist:
//!
//! - [`DensityWrap`] tags high-density assets with their density factor so
//!   their logical size becomes `physical / density` on high-density
//!   displays.
//! - A caller-supplied [`ColorFilter`], applied unconditionally when present
//!   (e.g., a brightness correction for a custom theme).
//!
//! Transforms are applied in registration order, each receiving the output of
//! the previous. A transform may return its input unchanged, and transforms
//! never fail: a filter that cannot be applied is a contract violation of the
//! collaborator, not of this pipeline.

use std::sync::Arc;

use crate::decode::DecodedImage;
use crate::variant::CandidateVariant;

/// A single post-decode transform stage.
pub trait IconTransform: Send + Sync {
    /// Transform the raster for the given chosen candidate.
    fn apply(&self, image: DecodedImage, variant: &CandidateVariant) -> DecodedImage;
}

/// A per-pixel RGBA color map.
///
/// Filters are pure pixel functions; they are independent of which variant
/// was chosen and must not fail.
pub trait ColorFilter: Send + Sync {
    /// Map one RGBA pixel.
    fn filter_pixel(&self, rgba: [u8; 4]) -> [u8; 4];
}

/// Tags a high-density asset so it renders at its logical size.
///
/// If the chosen candidate has a density factor above 1 and the runtime
/// display is high-density, the raster keeps its physical pixel data but its
/// logical size becomes `physical / density`. On a standard-density display a
/// high-density asset is used at native resolution without compensation;
/// there is no decode-time downscaling in this pipeline.
pub struct DensityWrap {
    high_density_display: bool,
}

impl DensityWrap {
    /// Create a density wrap for the given runtime display density.
    pub fn new(high_density_display: bool) -> Self {
        Self { high_density_display }
    }
}

impl IconTransform for DensityWrap {
    fn apply(&self, image: DecodedImage, variant: &CandidateVariant) -> DecodedImage {
        if variant.density > 1 && self.high_density_display {
            image.with_density(variant.density)
        } else {
            image
        }
    }
}

/// Adapts a [`ColorFilter`] into a pipeline stage.
pub struct FilterTransform {
    filter: Arc<dyn ColorFilter>,
}

impl FilterTransform {
    /// Wrap a color filter as a transform.
    pub fn new(filter: Arc<dyn ColorFilter>) -> Self {
        Self { filter }
    }
}

impl IconTransform for FilterTransform {
    fn apply(&self, image: DecodedImage, _variant: &CandidateVariant) -> DecodedImage {
        image.map_pixels(|rgba| self.filter.filter_pixel(rgba))
    }
}

/// An ordered list of transforms applied to a freshly decoded raster.
#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn IconTransform>>,
}

impl TransformPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transform stage (builder form).
    #[must_use]
    pub fn with(mut self, transform: impl IconTransform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Append a transform stage.
    pub fn push(&mut self, transform: impl IconTransform + 'static) {
        self.transforms.push(Box::new(transform));
    }

    /// Run the raster through every stage in registration order.
    pub fn apply(&self, image: DecodedImage, variant: &CandidateVariant) -> DecodedImage {
        self.transforms
            .iter()
            .fold(image, |img, t| t.apply(img, variant))
    }
}

// ============================================================================
// Built-in filters
// ============================================================================

/// Desaturates to luminance, used for disabled-state icons.
pub struct GrayscaleFilter;

impl ColorFilter for GrayscaleFilter {
    fn filter_pixel(&self, [r, g, b, a]: [u8; 4]) -> [u8; 4] {
        // Rec. 601 luma weights.
        let luma = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) as u8;
        [luma, luma, luma, a]
    }
}

/// Multiplies the alpha channel by a constant factor in `[0, 1]`.
pub struct OpacityFilter {
    alpha: f32,
}

impl OpacityFilter {
    /// Create an opacity filter; `alpha` is clamped to `[0, 1]`.
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
        }
    }
}

impl ColorFilter for OpacityFilter {
    fn filter_pixel(&self, [r, g, b, a]: [u8; 4]) -> [u8; 4] {
        [r, g, b, (a as f32 * self.alpha) as u8]
    }
}
