//! Candidate variant resolution.
//!
//! A logical identifier like `icons/save.png` expands into an ordered list of
//! physical resource names depending on the current presentation flags:
//!
//! - `icons/save@2x_dark.png`: dark theme on a high-density display
//! - `icons/save_dark.png`: dark theme
//! - `icons/save@2x.png`: high-density display
//! - `icons/save.png`: the canonical resource, always last
//!
//! Resolution is a pure function of the identifier and the flags; it performs
//! no I/O. Order is significant: the first candidate that fetches and decodes
//! successfully wins, and the canonical fallback guarantees the list is never
//! empty.

use crate::flags::PresentationFlags;

/// A concrete physical resource name derived from a base identifier plus
/// presentation flags.
///
/// Candidates are ephemeral: they are produced during materialization and not
/// stored anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateVariant {
    /// The physical resource name to fetch.
    pub identifier: String,
    /// Scale factor between the asset's pixel data and its logical size
    /// (1 for standard assets, 2 for `@2x` assets).
    pub density: u32,
    /// True for the canonical base identifier, which closes every list.
    pub fallback: bool,
}

impl CandidateVariant {
    fn new(identifier: String, density: u32, fallback: bool) -> Self {
        Self {
            identifier,
            density,
            fallback,
        }
    }
}

/// Expand a base identifier into candidate variants, most specific first.
///
/// The returned list is never empty; its last element is always the canonical
/// candidate equal to `base` with density 1. Variant names are only derived
/// when the identifier has an extension; an extensionless identifier resolves
/// to just its canonical candidate.
pub fn resolve(base: &str, flags: PresentationFlags) -> Vec<CandidateVariant> {
    let mut candidates = Vec::with_capacity(4);

    if let Some((name, ext)) = split_extension(base) {
        if flags.dark && flags.high_density {
            candidates.push(CandidateVariant::new(format!("{name}@2x_dark.{ext}"), 2, false));
        }
        if flags.dark {
            candidates.push(CandidateVariant::new(format!("{name}_dark.{ext}"), 1, false));
        }
        if flags.high_density {
            candidates.push(CandidateVariant::new(format!("{name}@2x.{ext}"), 2, false));
        }
    }

    candidates.push(CandidateVariant::new(base.to_string(), 1, true));
    candidates
}

/// Split an identifier at its last `.` into (name, extension).
///
/// Returns `None` when there is no extension in the final path segment.
fn split_extension(identifier: &str) -> Option<(&str, &str)> {
    let dot = identifier.rfind('.')?;
    // A dot inside a directory component is not an extension.
    if identifier[dot..].contains('/') {
        return None;
    }
    let (name, ext) = identifier.split_at(dot);
    let ext = &ext[1..];
    if name.is_empty() || ext.is_empty() {
        return None;
    }
    Some((name, ext))
}
