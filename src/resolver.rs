//! Property value resolution.
//!
//! Expands `{variable}` placeholders against a request-scoped lookup and
//! classifies the resolved string as a literal, a `file://` reference or a
//! URL reference. Nothing here performs I/O; dereferencing goes through the
//! resource caches owned by [`crate::runtime::CalloutRuntime`].

use regex::Regex;
use std::sync::OnceLock;

/// Placeholder pattern: non-empty name, no nested braces.
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

/// URL reference pattern.
static URL_REGEX: OnceLock<Regex> = OnceLock::new();

const FILE_SCHEME: &str = "file://";

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("Invalid regex"))
}

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| Regex::new(r"^https?://.+$").expect("Invalid regex"))
}

/// Classification of a resolved property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRef<'a> {
    /// Used as-is.
    Literal(&'a str),
    /// Resource name under the resource directory (`file://` stripped).
    FileRef(&'a str),
    /// Full `http://` or `https://` URL.
    UrlRef(&'a str),
}

/// Expand every `{name}` placeholder in `template`.
///
/// Names the lookup doesn't know expand to the empty string.
pub fn resolve<F>(template: &str, variables: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    placeholder_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            variables(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

/// Classify a resolved value.
pub fn classify(resolved: &str) -> SourceRef<'_> {
    if let Some(path) = resolved.strip_prefix(FILE_SCHEME) {
        SourceRef::FileRef(path)
    } else if url_regex().is_match(resolved) {
        SourceRef::UrlRef(resolved)
    } else {
        SourceRef::Literal(resolved)
    }
}
