//! Theme- and density-aware icon loading and caching.
//!
//! This crate resolves a logical icon identifier (a path like
//! `icons/save.png`) plus the current presentation flags (dark theme,
//! high-density display) into a decoded, display-ready bitmap, and caches the
//! decoded result so repeated lookups avoid redundant I/O and decoding.
//!
//! # How a lookup works
//!
//! 1. The identifier expands into an ordered list of candidate variants:
//!    `save@2x_dark.png`, `save_dark.png`, `save@2x.png`, then the canonical
//!    `save.png` as the guaranteed fallback.
//! 2. The first candidate that fetches and decodes successfully wins.
//! 3. The decoded raster runs through the transform pipeline (optional color
//!    filter, density wrapping for `@2x` assets on high-density displays).
//! 4. The result is memoized per identifier, tagged with the flags snapshot
//!    it was computed under. Flipping dark mode invalidates lazily: stale
//!    entries recompute on their next lookup.
//!
//! Small icons are cached strongly; large ones sit behind a byte-budgeted
//! retention pool and may be reclaimed under memory pressure, in which case
//! the next lookup decodes them again.
//!
//! # Example
//!
//! ```no_run
//! use iconic::{DirFetcher, IconRegistry, RegistryConfig};
//!
//! let registry = IconRegistry::new(DirFetcher::new("assets"), RegistryConfig::default());
//!
//! // Never fails: a zero-size placeholder stands in for missing icons.
//! let icon = registry.lookup("icons/save.png");
//! println!("{}x{} logical pixels", icon.width(), icon.height());
//!
//! // Theme switch: cached icons revalidate lazily on their next lookup.
//! iconic::set_dark_mode(true);
//! let dark_icon = registry.lookup("icons/save.png");
//! ```
//!
//! # Concurrency
//!
//! Lookups may run concurrently from any thread. Materialization is
//! serialized per entry: concurrent first lookups of a cold identifier block
//! on a single fetch+decode instead of duplicating it, and contention on one
//! icon never blocks unrelated icons.

mod decode;
mod entry;
mod error;
mod fetch;
mod flags;
mod icon;
mod pool;
mod registry;
mod transform;
mod variant;

// Lookup surface
pub use registry::{IconRegistry, RegistryConfig};

// Presentation state
pub use flags::{set_dark_mode, IconEnvironment, PresentationFlags, SharedEnvironment};

// Resolution and decoding building blocks
pub use decode::{decode, DecodedImage};
pub use fetch::{DirFetcher, FetchError, ResourceFetcher};
pub use variant::{resolve, CandidateVariant};

// Transforms
pub use transform::{
    ColorFilter, DensityWrap, FilterTransform, GrayscaleFilter, IconTransform, OpacityFilter,
    TransformPipeline,
};

// Final values
pub use error::{IconError, IconResult};
pub use icon::{PaintSurface, RenderableIcon};
