//! Resource fetch error types.

use std::fmt;
use std::io;

/// Errors produced while loading a resource into a cache.
///
/// Cloneable so every waiter on a shared load receives the same error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// File resource or URL does not exist.
    NotFound { resource: String },

    /// I/O failure reading a file resource.
    Io {
        resource: String,
        kind: io::ErrorKind,
        message: String,
    },

    /// URL answered with a non-success status.
    Http { url: String, status: u16 },

    /// URL could not be reached.
    Request { url: String, message: String },

    /// Content is not valid UTF-8 text.
    InvalidContent { resource: String },

    /// The loader panicked before producing a result.
    Aborted { key: String },
}

impl FetchError {
    /// Build from an I/O error, folding `NotFound` into [`FetchError::NotFound`].
    pub fn from_io(resource: impl Into<String>, error: &io::Error) -> Self {
        let resource = resource.into();
        if error.kind() == io::ErrorKind::NotFound {
            FetchError::NotFound { resource }
        } else {
            FetchError::Io {
                resource,
                kind: error.kind(),
                message: error.to_string(),
            }
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
            || matches!(self, FetchError::Http { status: 404, .. })
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NotFound { resource } => {
                write!(f, "resource \"{}\" not found", resource)
            }
            FetchError::Io {
                resource, message, ..
            } => write!(f, "failed to read \"{}\": {}", resource, message),
            FetchError::Http { url, status: 404 } => {
                write!(f, "resource \"{}\" not found (HTTP 404)", url)
            }
            FetchError::Http { url, status } => {
                write!(f, "fetching \"{}\" returned HTTP {}", url, status)
            }
            FetchError::Request { url, message } => {
                write!(f, "fetching \"{}\" failed: {}", url, message)
            }
            FetchError::InvalidContent { resource } => {
                write!(f, "resource \"{}\" is not valid UTF-8", resource)
            }
            FetchError::Aborted { key } => {
                write!(f, "loading \"{}\" was aborted", key)
            }
        }
    }
}

impl std::error::Error for FetchError {}
