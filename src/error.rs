//! Error types surfaced by the library.

use std::path::PathBuf;

use crate::parser::ParseError;

/// Errors that stop a tree from being loaded.
///
/// Everything after a successful load (flattening, filtering, matching)
/// is infallible.
#[derive(Debug, thiserror::Error)]
pub enum InstalledError {
    /// No manifest exists at the requested location.
    #[error("No package.json at {}", path.display())]
    ManifestNotFound { path: PathBuf },

    /// A manifest exists but could not be read or parsed.
    #[error("Invalid package.json at {}: {source}", path.display())]
    ManifestInvalid {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// A directory in the installed tree could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, InstalledError>;
