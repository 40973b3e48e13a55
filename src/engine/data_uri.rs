//! `data:` URI support for documents referenced from stylesheets.

use super::TransformError;

const DATA_XML_PREFIX: &str = "data:text/xml,";

/// Resolves document references (`document()`, `xsl:include`, ...) to text.
pub trait UriResolver: Send {
    /// `Ok(None)` means "not mine"; the engine falls back to its own resolution.
    fn resolve(&self, href: &str, base: &str) -> Result<Option<String>, TransformError>;
}

/// Serves immediate `data:text/xml,` documents and delegates everything else.
pub struct DataUriResolver {
    fallback: Option<Box<dyn UriResolver>>,
}

impl DataUriResolver {
    pub fn new(fallback: Option<Box<dyn UriResolver>>) -> Self {
        Self { fallback }
    }
}

impl UriResolver for DataUriResolver {
    fn resolve(&self, href: &str, base: &str) -> Result<Option<String>, TransformError> {
        if base.is_empty() {
            if let Some(document) = href.strip_prefix(DATA_XML_PREFIX) {
                return Ok(Some(document.to_string()));
            }
        }
        match &self.fallback {
            Some(fallback) => fallback.resolve(href, base),
            None => Ok(None),
        }
    }
}
