//! Resource fetching contract.
//!
//! The cache core does not care how identifiers map to physical resources; it
//! only requires the single-method [`ResourceFetcher`] contract. A
//! filesystem-rooted implementation, [`DirFetcher`], is provided for the
//! common case of icons shipped alongside the application. Embedded assets,
//! archives, or network stores plug in by implementing the trait.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors a fetcher can report for a single candidate identifier.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The identifier does not name an existing resource.
    #[error("resource not found")]
    NotFound,

    /// The resource exists but could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Maps a candidate identifier to raw bytes.
///
/// Implementations must be usable from multiple threads: lookups for
/// different identifiers may fetch concurrently. Timeout policy for slow
/// stores belongs to the implementation, not to the cache core.
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the raw bytes for `identifier`, or report why it is unavailable.
    fn fetch(&self, identifier: &str) -> Result<Vec<u8>, FetchError>;
}

impl<T: ResourceFetcher + ?Sized> ResourceFetcher for Arc<T> {
    fn fetch(&self, identifier: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(identifier)
    }
}

/// Fetches resources from a directory root on the local filesystem.
///
/// Identifiers are interpreted as paths relative to the root, so the variant
/// naming convention maps directly onto sibling files
/// (`icons/save.png`, `icons/save@2x.png`, ...).
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    /// Create a fetcher rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory root identifiers are resolved against.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl ResourceFetcher for DirFetcher {
    fn fetch(&self, identifier: &str) -> Result<Vec<u8>, FetchError> {
        match fs::read(self.root.join(identifier)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FetchError::NotFound),
            Err(e) => Err(FetchError::Io(e)),
        }
    }
}
