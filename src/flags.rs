//! Process-wide presentation state.
//!
//! Variant resolution and cache validity checks both read the current
//! [`PresentationFlags`]. The flags are deliberately modeled as an explicit
//! shared state object ([`IconEnvironment`]) with a narrow write API rather
//! than ambient globals: every materialization captures a flags snapshot at
//! its start, and cache invalidation is an explicit snapshot comparison.
//!
//! A process-wide default environment is available through
//! [`IconEnvironment::global()`]; registries created without an explicit
//! environment use it. Tests typically construct a private environment so
//! they can flip flags without affecting each other.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

/// Presentation flags under which an icon is resolved and decoded.
///
/// A copy of this struct acts as the snapshot tag on cached values: a cached
/// icon whose snapshot no longer equals the current flags is stale and gets
/// recomputed on the next lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PresentationFlags {
    /// Whether the dark theme is active.
    pub dark: bool,
    /// Whether the display is high-density (e.g., Retina at 2x).
    pub high_density: bool,
}

impl PresentationFlags {
    /// Create flags from explicit values.
    pub fn new(dark: bool, high_density: bool) -> Self {
        Self { dark, high_density }
    }
}

/// Shared, mutable presentation state.
///
/// Flags may be mutated by any thread at any time; there is no transactional
/// guarantee relative to in-flight materializations. A materialization that
/// started under old flags caches a result tagged with the snapshot it
/// captured at start, and the next lookup revalidates.
pub struct IconEnvironment {
    flags: RwLock<PresentationFlags>,
}

impl IconEnvironment {
    /// Create an environment with the given initial flags.
    pub fn new(flags: PresentationFlags) -> Self {
        Self {
            flags: RwLock::new(flags),
        }
    }

    /// Create an environment with default flags (light theme, standard density).
    pub fn with_defaults() -> Self {
        Self::new(PresentationFlags::default())
    }

    /// Create an environment seeded from the operating system color scheme.
    ///
    /// High density is left unset; display density detection belongs to the
    /// windowing layer, which should call [`set_high_density`](Self::set_high_density)
    /// once it knows the scale factor.
    #[cfg(feature = "system-theme")]
    pub fn detect() -> Self {
        let dark = matches!(dark_light::detect(), dark_light::Mode::Dark);
        Self::new(PresentationFlags::new(dark, false))
    }

    /// The process-wide default environment.
    pub fn global() -> &'static IconEnvironment {
        global_shared()
    }

    /// A shared handle to the process-wide default environment.
    pub fn global_handle() -> SharedEnvironment {
        global_shared().clone()
    }

    /// Get a snapshot of the current flags.
    pub fn flags(&self) -> PresentationFlags {
        *self.flags.read()
    }

    /// Enable or disable dark-theme icon variants.
    ///
    /// Cached icons computed under the previous setting become stale and are
    /// recomputed lazily on their next lookup.
    pub fn set_dark_mode(&self, dark: bool) {
        let mut flags = self.flags.write();
        if flags.dark != dark {
            flags.dark = dark;
            tracing::debug!(dark, "dark mode changed, cached icons will revalidate");
        }
    }

    /// Record whether the runtime display is high-density.
    ///
    /// This is supplied by a platform-detection collaborator (typically the
    /// windowing layer reporting a scale factor above 1.0).
    pub fn set_high_density(&self, high_density: bool) {
        let mut flags = self.flags.write();
        if flags.high_density != high_density {
            flags.high_density = high_density;
            tracing::debug!(high_density, "display density changed, cached icons will revalidate");
        }
    }
}

impl Default for IconEnvironment {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for IconEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconEnvironment")
            .field("flags", &self.flags())
            .finish()
    }
}

/// Enable or disable dark-theme icon variants on the global environment.
pub fn set_dark_mode(dark: bool) {
    IconEnvironment::global().set_dark_mode(dark);
}

/// Shared handle type for passing an environment between registries.
pub type SharedEnvironment = Arc<IconEnvironment>;

fn global_shared() -> &'static SharedEnvironment {
    static GLOBAL: OnceLock<SharedEnvironment> = OnceLock::new();
    GLOBAL.get_or_init(|| Arc::new(IconEnvironment::with_defaults()))
}
