//! Typed callout properties.

use std::collections::{BTreeMap, HashMap};

use crate::config::ConfigError;
use crate::engine::EngineKind;

const DEFAULT_ENGINE: &str = "saxon";
const DEFAULT_INPUT: &str = "message";
const DEFAULT_OUTPUT: &str = "message.content";
const PARAM_PREFIX: &str = "param_";

/// Validated callout properties.
///
/// Values may still hold `{variable}` placeholders; they are expanded per
/// invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutConfig {
    engine: String,
    xslt: String,
    input: String,
    output: String,
    debug: bool,
    params: BTreeMap<String, String>,
}

impl CalloutConfig {
    /// Validate a host property map.
    ///
    /// | Property | Default |
    /// |----------|---------|
    /// | `engine` | `saxon` |
    /// | `xslt` (or `source`) | required |
    /// | `input` | `message` |
    /// | `output` | `message.content` |
    /// | `debug` | `false` |
    /// | `param_<name>` | - |
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let xslt = properties
            .get("xslt")
            .or_else(|| properties.get("source"))
            .ok_or_else(|| ConfigError::Missing { key: "xslt".into() })?;
        if xslt.trim().is_empty() {
            return Err(ConfigError::Empty { key: "xslt".into() });
        }

        let engine = non_empty(properties, "engine").unwrap_or(DEFAULT_ENGINE);
        // Placeholder-free names can be checked now rather than per request.
        if !engine.contains('{') {
            EngineKind::parse(engine)?;
        }

        let mut params = BTreeMap::new();
        for (key, value) in properties {
            let Some(name) = key.strip_prefix(PARAM_PREFIX) else {
                continue;
            };
            if name.is_empty() {
                tracing::debug!(property = %key, "ignoring parameter without a name");
                continue;
            }
            params.insert(name.to_string(), value.clone());
        }

        Ok(Self {
            engine: engine.to_string(),
            xslt: xslt.clone(),
            input: non_empty(properties, "input")
                .unwrap_or(DEFAULT_INPUT)
                .to_string(),
            output: non_empty(properties, "output")
                .unwrap_or(DEFAULT_OUTPUT)
                .to_string(),
            debug: properties
                .get("debug")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
            params,
        })
    }

    /// Engine name or placeholder expression.
    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Stylesheet text, reference, or placeholder expression.
    pub fn xslt(&self) -> &str {
        &self.xslt
    }

    /// Variable holding the document to transform.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Variable receiving the result.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Stylesheet parameters by name, values unresolved.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

fn non_empty<'a>(properties: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    properties
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}
