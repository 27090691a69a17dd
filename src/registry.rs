//! Process-wide icon registry.
//!
//! The registry maps source identifiers to their cache entries and is the
//! lookup surface UI code talks to. [`lookup`](IconRegistry::lookup) never
//! fails: when every candidate variant is exhausted it returns the shared
//! zero-size placeholder, so paint call sites need no error handling. Test
//! and diagnostic contexts use [`try_lookup`](IconRegistry::try_lookup),
//! which surfaces the failure kind instead of substituting the placeholder.
//!
//! # Example
//!
//! ```no_run
//! use iconic::{DirFetcher, IconRegistry, RegistryConfig};
//!
//! let registry = IconRegistry::new(
//!     DirFetcher::new("assets"),
//!     RegistryConfig::default().with_retain_budget_mb(16),
//! );
//!
//! let icon = registry.lookup("icons/save.png");
//! assert_eq!(icon.width(), icon.height());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::entry::{CacheEntry, MaterializeContext};
use crate::error::IconResult;
use crate::fetch::ResourceFetcher;
use crate::flags::{IconEnvironment, SharedEnvironment};
use crate::icon::RenderableIcon;
use crate::pool::RetainPool;
use crate::transform::ColorFilter;

/// Configuration for an [`IconRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Byte budget for strong retention of large decoded icons.
    /// Default: 32 MiB.
    pub retain_budget_bytes: usize,
    /// Icons with both physical dimensions below this are held strongly and
    /// never reclaimed. Default: 50.
    pub strong_hold_max_dim: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            retain_budget_bytes: 32 * 1024 * 1024,
            strong_hold_max_dim: 50,
        }
    }
}

impl RegistryConfig {
    /// Set the retention budget in bytes.
    #[must_use]
    pub fn with_retain_budget_bytes(mut self, bytes: usize) -> Self {
        self.retain_budget_bytes = bytes;
        self
    }

    /// Set the retention budget in megabytes.
    #[must_use]
    pub fn with_retain_budget_mb(mut self, mb: usize) -> Self {
        self.retain_budget_bytes = mb * 1024 * 1024;
        self
    }

    /// Set the strong-hold dimension threshold.
    #[must_use]
    pub fn with_strong_hold_max_dim(mut self, dim: u32) -> Self {
        self.strong_hold_max_dim = dim;
        self
    }
}

/// Maps identifiers to cache entries and drives their materialization.
///
/// Lookups for the same identifier share one entry; repeated lookups under
/// unchanged flags return observably equal icons (not necessarily the same
/// allocation if the cached value was reclaimed in between). Entries are
/// created on first lookup and never explicitly destroyed.
pub struct IconRegistry {
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
    fetcher: Box<dyn ResourceFetcher>,
    filter: Option<Arc<dyn ColorFilter>>,
    env: SharedEnvironment,
    pool: RetainPool,
    config: RegistryConfig,
}

impl IconRegistry {
    /// Create a registry over the given fetcher, reading presentation flags
    /// from the global environment.
    pub fn new(fetcher: impl ResourceFetcher + 'static, config: RegistryConfig) -> Self {
        Self::with_environment(fetcher, config, IconEnvironment::global_handle())
    }

    /// Create a registry with a private environment, typically for tests or
    /// embedded previews that must not follow the process-wide theme.
    pub fn with_environment(
        fetcher: impl ResourceFetcher + 'static,
        config: RegistryConfig,
        env: SharedEnvironment,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            fetcher: Box::new(fetcher),
            filter: None,
            env,
            pool: RetainPool::new(config.retain_budget_bytes),
            config,
        }
    }

    /// Install a color filter applied to every icon this registry decodes.
    #[must_use]
    pub fn with_color_filter(mut self, filter: impl ColorFilter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// The environment whose flags this registry resolves against.
    pub fn environment(&self) -> &IconEnvironment {
        &self.env
    }

    /// Number of identifiers with a cache entry.
    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Look up the icon for `identifier`, decoding it on first use.
    ///
    /// Never fails: if no candidate variant resolves, the shared zero-size
    /// placeholder is returned and the failure is logged. The entry stays
    /// empty, so a later lookup retries naturally.
    pub fn lookup(&self, identifier: &str) -> Arc<RenderableIcon> {
        match self.try_lookup(identifier) {
            Ok(icon) => icon,
            Err(e) => {
                tracing::warn!(identifier, error = %e, "icon lookup failed, using placeholder");
                RenderableIcon::empty()
            }
        }
    }

    /// Strict lookup: surface the failure kind instead of substituting the
    /// placeholder.
    pub fn try_lookup(&self, identifier: &str) -> IconResult<Arc<RenderableIcon>> {
        let entry = self.entry(identifier);
        let ctx = MaterializeContext {
            fetcher: self.fetcher.as_ref(),
            filter: self.filter.as_ref(),
            env: &self.env,
            pool: &self.pool,
            strong_hold_max_dim: self.config.strong_hold_max_dim,
        };
        entry.materialize(&ctx)
    }

    /// Find or create the cache entry for `identifier`.
    fn entry(&self, identifier: &str) -> Arc<CacheEntry> {
        if let Some(entry) = self.entries.read().get(identifier) {
            return entry.clone();
        }
        let mut entries = self.entries.write();
        entries
            .entry(identifier.to_string())
            .or_insert_with(|| Arc::new(CacheEntry::new(identifier)))
            .clone()
    }
}

impl std::fmt::Debug for IconRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconRegistry")
            .field("entries", &self.entry_count())
            .field("flags", &self.env.flags())
            .finish()
    }
}

