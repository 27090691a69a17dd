//! Strong retention pool for large cached icons.
//!
//! Cache entries hold large decoded icons through a `Weak` reference; the
//! owning strong handle lives here. The pool keeps strong handles within a
//! byte budget and drops the least-recently-touched ones first when the
//! budget is exceeded. Dropping a handle kills the entry's `Weak`, which the
//! entry observes as a reclaimed value on its next read and recomputes.
//!
//! This is the explicit, bounded substitute for the runtime-managed soft
//! references the design historically relied on: there is no opportunistic
//! GC-driven reclamation here, so memory pressure is modeled as a fixed
//! budget instead.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::icon::RenderableIcon;

struct PoolSlot {
    icon: Arc<RenderableIcon>,
    bytes: usize,
    last_touch: u64,
}

struct PoolInner {
    slots: HashMap<String, PoolSlot>,
    used_bytes: usize,
    tick: u64,
}

/// Byte-budgeted holder of strong handles to large decoded icons.
pub(crate) struct RetainPool {
    budget_bytes: usize,
    inner: Mutex<PoolInner>,
}

impl RetainPool {
    pub(crate) fn new(budget_bytes: usize) -> Self {
        Self {
            budget_bytes,
            inner: Mutex::new(PoolInner {
                slots: HashMap::new(),
                used_bytes: 0,
                tick: 0,
            }),
        }
    }

    /// Park a strong handle for `identifier`, evicting stale handles if the
    /// budget is exceeded.
    ///
    /// An icon larger than the whole budget is still retained as the sole
    /// occupant; refusing it would demote its entry on every read and turn
    /// each lookup into a full decode.
    pub(crate) fn retain(&self, identifier: &str, icon: Arc<RenderableIcon>) {
        let bytes = icon.byte_size();
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;

        if let Some(old) = inner.slots.remove(identifier) {
            inner.used_bytes -= old.bytes;
        }
        inner.used_bytes += bytes;
        inner.slots.insert(
            identifier.to_string(),
            PoolSlot {
                icon,
                bytes,
                last_touch: tick,
            },
        );

        self.evict_over_budget(&mut inner, identifier);
    }

    /// Refresh the recency of `identifier` after a cache hit.
    pub(crate) fn touch(&self, identifier: &str) {
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        if let Some(slot) = inner.slots.get_mut(identifier) {
            slot.last_touch = tick;
        }
    }

    /// Drop the strong handle for `identifier`, if any. Used when an entry
    /// goes stale so the superseded raster does not count against the budget.
    pub(crate) fn release(&self, identifier: &str) {
        let mut inner = self.inner.lock();
        if let Some(slot) = inner.slots.remove(identifier) {
            inner.used_bytes -= slot.bytes;
        }
    }

    fn evict_over_budget(&self, inner: &mut PoolInner, just_inserted: &str) {
        while inner.used_bytes > self.budget_bytes && inner.slots.len() > 1 {
            let victim = inner
                .slots
                .iter()
                .filter(|(id, _)| id.as_str() != just_inserted)
                .min_by_key(|(_, slot)| slot.last_touch)
                .map(|(id, _)| id.clone());

            match victim {
                Some(id) => {
                    if let Some(slot) = inner.slots.remove(&id) {
                        inner.used_bytes -= slot.bytes;
                        tracing::debug!(identifier = %id, bytes = slot.bytes, "reclaimed cached icon");
                    }
                }
                None => break,
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, identifier: &str) -> bool {
        self.inner.lock().slots.contains_key(identifier)
    }

    #[cfg(test)]
    pub(crate) fn used_bytes(&self) -> usize {
        self.inner.lock().used_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodedImage;
    use image::RgbaImage;

    fn icon(width: u32, height: u32) -> Arc<RenderableIcon> {
        Arc::new(RenderableIcon::from_decoded(DecodedImage::from_rgba(
            RgbaImage::new(width, height),
        )))
    }

    #[test]
    fn test_retain_within_budget_keeps_everything() {
        let pool = RetainPool::new(10_000);
        pool.retain("a.png", icon(10, 10)); // 400 bytes
        pool.retain("b.png", icon(10, 10));
        assert!(pool.contains("a.png"));
        assert!(pool.contains("b.png"));
        assert_eq!(pool.used_bytes(), 800);
    }

    #[test]
    fn test_over_budget_evicts_least_recently_touched() {
        // Budget fits one 10x10 icon (400 bytes) but not two.
        let pool = RetainPool::new(500);
        pool.retain("a.png", icon(10, 10));
        pool.retain("b.png", icon(10, 10));

        assert!(!pool.contains("a.png"));
        assert!(pool.contains("b.png"));
    }

    #[test]
    fn test_touch_protects_from_eviction() {
        // Budget fits two 10x10 icons but not three.
        let pool = RetainPool::new(900);
        pool.retain("a.png", icon(10, 10));
        pool.retain("b.png", icon(10, 10));
        pool.touch("a.png");
        pool.retain("c.png", icon(10, 10));

        assert!(pool.contains("a.png"));
        assert!(!pool.contains("b.png"));
        assert!(pool.contains("c.png"));
    }

    #[test]
    fn test_oversized_icon_is_retained_alone() {
        let pool = RetainPool::new(100);
        pool.retain("small.png", icon(2, 2));
        pool.retain("huge.png", icon(100, 100));

        assert!(pool.contains("huge.png"));
        assert!(!pool.contains("small.png"));
    }

    #[test]
    fn test_release_drops_strong_handle() {
        let pool = RetainPool::new(10_000);
        let handle = icon(10, 10);
        let weak = Arc::downgrade(&handle);
        pool.retain("a.png", handle);
        drop(weak.upgrade()); // still alive via the pool

        pool.release("a.png");
        assert!(weak.upgrade().is_none());
        assert_eq!(pool.used_bytes(), 0);
    }

    #[test]
    fn test_re_retain_replaces_existing_slot() {
        let pool = RetainPool::new(10_000);
        pool.retain("a.png", icon(10, 10));
        pool.retain("a.png", icon(20, 10));
        assert_eq!(pool.used_bytes(), 800);
    }
}
