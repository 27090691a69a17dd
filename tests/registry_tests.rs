//! Integration tests for the icon registry: lookup, invalidation,
//! concurrency, and failure fallback.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use iconic::{
    DirFetcher, FetchError, GrayscaleFilter, IconEnvironment, IconRegistry, PresentationFlags,
    RegistryConfig, ResourceFetcher,
};

/// Initialize logging so warn-level fallbacks show up under `--nocapture`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// In-memory fetcher that counts fetch calls.
struct MapFetcher {
    resources: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl MapFetcher {
    fn new(resources: impl IntoIterator<Item = (&'static str, Vec<u8>)>) -> Self {
        Self {
            resources: resources
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ResourceFetcher for MapFetcher {
    fn fetch(&self, identifier: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.resources
            .get(identifier)
            .cloned()
            .ok_or(FetchError::NotFound)
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 60, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn private_env(dark: bool, high_density: bool) -> Arc<IconEnvironment> {
    Arc::new(IconEnvironment::new(PresentationFlags::new(dark, high_density)))
}

#[test]
fn test_repeated_lookups_are_idempotent_and_cached() {
    init_tracing();
    let fetcher = Arc::new(MapFetcher::new([("icons/save.png", png_bytes(16, 16))]));
    let registry = IconRegistry::with_environment(
        fetcher.clone(),
        RegistryConfig::default(),
        private_env(false, false),
    );

    let first = registry.lookup("icons/save.png");
    let second = registry.lookup("icons/save.png");

    assert_eq!(first.width(), second.width());
    assert_eq!(first.height(), second.height());
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(registry.entry_count(), 1);
}

#[test]
fn test_dark_mode_flip_triggers_fresh_decode() {
    init_tracing();
    let fetcher = Arc::new(MapFetcher::new([
        ("icons/save.png", png_bytes(16, 16)),
        ("icons/save_dark.png", png_bytes(18, 18)),
    ]));
    let env = private_env(false, false);
    let registry =
        IconRegistry::with_environment(fetcher.clone(), RegistryConfig::default(), env.clone());

    let light = registry.lookup("icons/save.png");
    assert_eq!(light.width(), 16);
    let calls_after_first = fetcher.calls();

    env.set_dark_mode(true);
    let dark = registry.lookup("icons/save.png");

    assert_eq!(dark.width(), 18);
    assert!(fetcher.calls() > calls_after_first);

    // Flipping back recomputes again and lands on the canonical asset.
    env.set_dark_mode(false);
    assert_eq!(registry.lookup("icons/save.png").width(), 16);
}

#[test]
fn test_concurrent_cold_lookups_decode_exactly_once() {
    init_tracing();
    let fetcher = Arc::new(MapFetcher::new([("icons/save.png", png_bytes(16, 16))]));
    let registry = Arc::new(IconRegistry::with_environment(
        fetcher.clone(),
        RegistryConfig::default(),
        private_env(false, false),
    ));

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                registry.lookup("icons/save.png")
            })
        })
        .collect();

    let icons: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Default flags resolve to a single candidate, so one fetch means one
    // decode: concurrent callers waited on the in-flight computation.
    assert_eq!(fetcher.calls(), 1);
    for icon in &icons {
        assert!(Arc::ptr_eq(icon, &icons[0]));
    }
}

#[test]
fn test_missing_icon_yields_placeholder_in_non_strict_mode() {
    init_tracing();
    let fetcher = Arc::new(MapFetcher::new([]));
    let registry = IconRegistry::with_environment(
        fetcher.clone(),
        RegistryConfig::default(),
        private_env(false, false),
    );

    let icon = registry.lookup("icons/absent.png");
    assert!(icon.is_empty());
    assert_eq!(icon.width(), 0);
    assert_eq!(icon.height(), 0);

    // Nothing was cached: the next lookup retries the resolution.
    let _ = registry.lookup("icons/absent.png");
    assert_eq!(fetcher.calls(), 2);
}

#[test]
fn test_missing_icon_surfaces_not_found_in_strict_mode() {
    init_tracing();
    let registry = IconRegistry::with_environment(
        MapFetcher::new([]),
        RegistryConfig::default(),
        private_env(false, false),
    );

    let err = registry.try_lookup("icons/absent.png").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_corrupt_variant_falls_through_to_canonical() {
    init_tracing();
    let fetcher = Arc::new(MapFetcher::new([
        ("icons/save_dark.png", b"corrupt bytes".to_vec()),
        ("icons/save.png", png_bytes(16, 16)),
    ]));
    let registry = IconRegistry::with_environment(
        fetcher.clone(),
        RegistryConfig::default(),
        private_env(true, false),
    );

    let icon = registry.lookup("icons/save.png");
    assert_eq!(icon.width(), 16);
    assert_eq!(fetcher.calls(), 2);
}

#[test]
fn test_high_density_asset_reports_logical_size() {
    init_tracing();
    let fetcher = Arc::new(MapFetcher::new([
        ("icons/save@2x.png", png_bytes(32, 32)),
        ("icons/save.png", png_bytes(16, 16)),
    ]));
    let registry = IconRegistry::with_environment(
        fetcher.clone(),
        RegistryConfig::default(),
        private_env(false, true),
    );

    let icon = registry.lookup("icons/save.png");
    assert_eq!(icon.physical_width(), 32);
    assert_eq!(icon.width(), 16);
    assert_eq!(icon.density(), 2);
}

#[test]
fn test_reclaimed_icon_is_recomputed_on_next_lookup() {
    init_tracing();
    // Every icon is reclaimable (strong hold disabled) and the budget fits
    // only one 16x16 icon, so the second lookup evicts the first.
    let fetcher = Arc::new(MapFetcher::new([
        ("a.png", png_bytes(16, 16)),
        ("b.png", png_bytes(16, 16)),
    ]));
    let config = RegistryConfig::default()
        .with_strong_hold_max_dim(0)
        .with_retain_budget_bytes(1500);
    let registry =
        IconRegistry::with_environment(fetcher.clone(), config, private_env(false, false));

    let a = registry.lookup("a.png");
    drop(a);
    let _b = registry.lookup("b.png"); // evicts a.png from the retain pool
    assert_eq!(fetcher.calls(), 2);

    // a.png was reclaimed: this lookup decodes again.
    let a = registry.lookup("a.png");
    assert_eq!(a.width(), 16);
    assert_eq!(fetcher.calls(), 3);

    // And it is cached again afterwards.
    let _ = registry.lookup("a.png");
    assert_eq!(fetcher.calls(), 3);
}

#[test]
fn test_color_filter_applies_to_every_lookup() {
    init_tracing();
    let fetcher = Arc::new(MapFetcher::new([("icons/save.png", png_bytes(8, 8))]));
    let registry = IconRegistry::with_environment(
        fetcher,
        RegistryConfig::default(),
        private_env(false, false),
    )
    .with_color_filter(GrayscaleFilter);

    let icon = registry.lookup("icons/save.png");
    let px = &icon.pixels()[..4];
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);
}

#[test]
fn test_dir_fetcher_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let icons = dir.path().join("icons");
    std::fs::create_dir(&icons).unwrap();
    std::fs::write(icons.join("save.png"), png_bytes(16, 16)).unwrap();
    std::fs::write(icons.join("save_dark.png"), png_bytes(20, 20)).unwrap();

    let env = private_env(false, false);
    let registry = IconRegistry::with_environment(
        DirFetcher::new(dir.path()),
        RegistryConfig::default(),
        env.clone(),
    );

    assert_eq!(registry.lookup("icons/save.png").width(), 16);

    env.set_dark_mode(true);
    assert_eq!(registry.lookup("icons/save.png").width(), 20);

    // Missing icon falls back to the placeholder.
    assert!(registry.lookup("icons/open.png").is_empty());
}

#[test]
fn test_global_environment_drives_default_registries() {
    init_tracing();
    let fetcher = Arc::new(MapFetcher::new([
        ("icons/quit.png", png_bytes(16, 16)),
        ("icons/quit_dark.png", png_bytes(18, 18)),
    ]));
    let registry = IconRegistry::new(fetcher, RegistryConfig::default());

    iconic::set_dark_mode(false);
    assert_eq!(registry.lookup("icons/quit.png").width(), 16);

    iconic::set_dark_mode(true);
    assert_eq!(registry.lookup("icons/quit.png").width(), 18);

    iconic::set_dark_mode(false);
}
