//! Error types for icon loading.

use thiserror::Error;

/// Errors that can occur while resolving, fetching, or decoding an icon.
#[derive(Error, Debug)]
pub enum IconError {
    /// No candidate variant resolved to existing bytes.
    #[error("no icon resource found for '{identifier}'")]
    NotFound {
        /// The base identifier that was looked up.
        identifier: String,
    },

    /// Bytes were fetched but are not a valid, supported image. Decodes with
    /// zero width or height are reported here as well.
    #[error("failed to decode icon '{identifier}': {message}")]
    Decode {
        /// The candidate identifier whose bytes failed to decode.
        identifier: String,
        message: String,
    },

    /// Transient fetch failure (e.g., a read error on an existing resource).
    #[error("I/O error while fetching icon '{identifier}'")]
    Io {
        /// The candidate identifier that failed to fetch.
        identifier: String,
        #[source]
        source: std::io::Error,
    },
}

impl IconError {
    /// Create a not-found error.
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(identifier: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            identifier: identifier.into(),
            source,
        }
    }

    /// Returns true if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IconError::NotFound { .. })
    }
}

/// Result type for icon operations.
pub type IconResult<T> = Result<T, IconError>;
