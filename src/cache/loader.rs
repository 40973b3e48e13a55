//! Resource loaders backing the file and URL caches.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use super::FetchError;

/// Loads named resources from a directory.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resource root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a resource as UTF-8 text.
    ///
    /// A leading `/` is ignored; names escaping the root are reported as
    /// not found.
    pub fn load(&self, name: &str) -> Result<String, FetchError> {
        let path = self.resolve(name).ok_or_else(|| FetchError::NotFound {
            resource: name.to_string(),
        })?;

        let bytes = std::fs::read(&path).map_err(|e| FetchError::from_io(name, &e))?;
        tracing::debug!(resource = %name, bytes = bytes.len(), "file resource loaded");

        String::from_utf8(bytes).map_err(|_| FetchError::InvalidContent {
            resource: name.to_string(),
        })
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name.trim_start_matches('/'));
        if relative.as_os_str().is_empty() {
            return None;
        }
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }
        Some(self.root.join(relative))
    }
}

/// Fetches resources over HTTP(S) with a blocking client.
#[derive(Debug, Clone)]
pub struct UrlLoader {
    #[cfg(feature = "url-loader")]
    client: reqwest::blocking::Client,
    #[cfg(not(feature = "url-loader"))]
    _timeout: Duration,
}

impl UrlLoader {
    /// Create a loader whose requests give up after `timeout`.
    #[cfg(feature = "url-loader")]
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    #[cfg(not(feature = "url-loader"))]
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self { _timeout: timeout })
    }

    /// Fetch a URL body as UTF-8 text.
    #[cfg(feature = "url-loader")]
    pub fn load(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(url = %url, bytes = bytes.len(), "url resource fetched");

        String::from_utf8(bytes.to_vec()).map_err(|_| FetchError::InvalidContent {
            resource: url.to_string(),
        })
    }

    #[cfg(not(feature = "url-loader"))]
    pub fn load(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::Request {
            url: url.to_string(),
            message: "built without the url-loader feature".to_string(),
        })
    }
}
