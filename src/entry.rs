//! Per-identifier cache entries.
//!
//! A [`CacheEntry`] owns the lazily computed, reclaimable handle to the
//! decoded and transformed icon for one source identifier, together with the
//! flags snapshot it was computed under. Entries are created on first lookup
//! and live for the registry's lifetime; only their cached value comes and
//! goes.
//!
//! Conceptually each entry is a small state machine: empty, computing, or
//! ready-with-snapshot. Staleness is not a stored state; it is detected on
//! read by comparing the stored snapshot against the current flags. The
//! entry's mutex covers the whole materialization, so concurrent callers of a
//! cold entry block on the in-flight computation instead of decoding twice.
//! The lock is scoped to this entry only; contention on one icon never blocks
//! unrelated icons.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::decode;
use crate::error::{IconError, IconResult};
use crate::fetch::{FetchError, ResourceFetcher};
use crate::flags::{IconEnvironment, PresentationFlags};
use crate::icon::RenderableIcon;
use crate::pool::RetainPool;
use crate::transform::{ColorFilter, DensityWrap, FilterTransform, TransformPipeline};
use crate::variant;

/// The cached value slot of an entry.
enum CachedSlot {
    /// Nothing cached; the next materialize computes from scratch.
    Empty,
    /// Small icons are held strongly: they are cheap to keep and expensive to
    /// constantly reacquire.
    Strong(Arc<RenderableIcon>),
    /// Large icons are held weakly; the strong handle lives in the retain
    /// pool and may be reclaimed under memory pressure.
    Reclaimable(Weak<RenderableIcon>),
}

struct EntryState {
    slot: CachedSlot,
    /// Flags snapshot captured at the start of the materialization that
    /// produced `slot`. A mismatch with the current flags marks the value
    /// stale.
    snapshot: PresentationFlags,
}

/// Everything a materialization needs from its registry.
pub(crate) struct MaterializeContext<'a> {
    pub fetcher: &'a dyn ResourceFetcher,
    pub filter: Option<&'a Arc<dyn ColorFilter>>,
    pub env: &'a IconEnvironment,
    pub pool: &'a RetainPool,
    /// Icons whose physical dimensions both stay below this are held
    /// strongly instead of through the retain pool.
    pub strong_hold_max_dim: u32,
}

/// Lazily computed, invalidation-aware cache slot for one source identifier.
pub(crate) struct CacheEntry {
    identifier: String,
    state: Mutex<EntryState>,
}

impl CacheEntry {
    pub(crate) fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            state: Mutex::new(EntryState {
                slot: CachedSlot::Empty,
                snapshot: PresentationFlags::default(),
            }),
        }
    }

    /// Return the cached icon, computing it first if the entry is empty,
    /// stale, or reclaimed.
    ///
    /// Fetch and decode run synchronously under the entry lock; a slow fetch
    /// stalls concurrent requesters of this one identifier only. On failure
    /// nothing is cached and the next call retries from scratch.
    pub(crate) fn materialize(&self, ctx: &MaterializeContext<'_>) -> IconResult<Arc<RenderableIcon>> {
        let mut state = self.state.lock();
        let flags = ctx.env.flags();

        if state.snapshot == flags {
            match &state.slot {
                CachedSlot::Strong(icon) => {
                    tracing::trace!(identifier = %self.identifier, "icon cache hit");
                    return Ok(icon.clone());
                }
                CachedSlot::Reclaimable(weak) => {
                    if let Some(icon) = weak.upgrade() {
                        tracing::trace!(identifier = %self.identifier, "icon cache hit");
                        ctx.pool.touch(&self.identifier);
                        return Ok(icon);
                    }
                    tracing::debug!(identifier = %self.identifier, "cached icon was reclaimed, recomputing");
                }
                CachedSlot::Empty => {}
            }
        } else if !matches!(state.slot, CachedSlot::Empty) {
            tracing::debug!(
                identifier = %self.identifier,
                ?flags,
                stale = ?state.snapshot,
                "presentation flags changed, recomputing icon"
            );
            ctx.pool.release(&self.identifier);
        }

        // Compute under the snapshot captured above. Flags may change while
        // we fetch and decode; the result stays tagged with this snapshot and
        // the next lookup revalidates.
        state.slot = CachedSlot::Empty;
        state.snapshot = flags;

        let icon = Arc::new(self.compute(ctx, flags)?);

        let small = icon.physical_width() < ctx.strong_hold_max_dim
            && icon.physical_height() < ctx.strong_hold_max_dim;
        state.slot = if small {
            CachedSlot::Strong(icon.clone())
        } else {
            ctx.pool.retain(&self.identifier, icon.clone());
            CachedSlot::Reclaimable(Arc::downgrade(&icon))
        };

        Ok(icon)
    }

    /// Run the resolve -> fetch -> decode -> transform sequence, trying each
    /// candidate in order until one succeeds.
    fn compute(
        &self,
        ctx: &MaterializeContext<'_>,
        flags: PresentationFlags,
    ) -> IconResult<RenderableIcon> {
        let mut pipeline = TransformPipeline::new();
        if let Some(filter) = ctx.filter {
            pipeline.push(FilterTransform::new(filter.clone()));
        }
        pipeline.push(DensityWrap::new(flags.high_density));

        let mut last_error = None;

        for candidate in variant::resolve(&self.identifier, flags) {
            let bytes = match ctx.fetcher.fetch(&candidate.identifier) {
                Ok(bytes) => bytes,
                Err(FetchError::NotFound) => {
                    last_error = Some(IconError::not_found(&self.identifier));
                    continue;
                }
                Err(FetchError::Io(e)) => {
                    tracing::warn!(
                        candidate = %candidate.identifier,
                        error = %e,
                        "icon fetch failed, trying next candidate"
                    );
                    last_error = Some(IconError::io(&candidate.identifier, e));
                    continue;
                }
            };

            match decode::decode(&candidate.identifier, &bytes) {
                Ok(image) => {
                    tracing::debug!(
                        identifier = %self.identifier,
                        candidate = %candidate.identifier,
                        density = candidate.density,
                        "loaded icon"
                    );
                    let image = pipeline.apply(image, &candidate);
                    return Ok(RenderableIcon::from_decoded(image));
                }
                Err(e) => {
                    tracing::warn!(
                        candidate = %candidate.identifier,
                        error = %e,
                        "icon decode failed, trying next candidate"
                    );
                    last_error = Some(e);
                }
            }
        }

        // The candidate list is never empty, so last_error is always set by
        // the canonical attempt.
        Err(last_error.unwrap_or_else(|| IconError::not_found(&self.identifier)))
    }
}
