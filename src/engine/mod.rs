//! Transform engine capabilities.
//!
//! The callout never runs a stylesheet itself. It asks an engine to compile
//! stylesheet text into a [`Processor`], pools the processor, and runs it
//! against request documents. Engines are selected by name through a closed
//! set of [`EngineKind`] variants and looked up in an [`EngineRegistry`].
//!
//! # Built-in Engines
//!
//! | Alias | Identifier | Description |
//! |-------|------------|-------------|
//! | `saxon` | `net.sf.saxon.TransformerFactoryImpl` | Default; host registers the implementation |
//! | `xalan` | `org.apache.xalan.processor.TransformerFactoryImpl` | Host registers the implementation |
//! | `passthrough` | `builtin.passthrough` | [`PassthroughEngine`], always available |
//!
//! Any name containing a `.` is taken as a fully-qualified identifier.

mod data_uri;
mod diagnostics;
mod passthrough;

pub use data_uri::{DataUriResolver, UriResolver};
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticListener, LastErrorListener, Severity};
pub use passthrough::PassthroughEngine;

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::config::ConfigError;

/// Error reported by an engine or processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    pub message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransformError {}

impl From<String> for TransformError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for TransformError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl From<std::io::Error> for TransformError {
    fn from(e: std::io::Error) -> Self {
        Self {
            message: format!("I/O error: {}", e),
        }
    }
}

/// A compiled stylesheet, reusable across runs after [`Processor::reset`].
pub trait Processor: Send {
    /// Bind a stylesheet parameter for the next run.
    fn set_parameter(&mut self, name: &str, value: &str);

    /// Transform `input` into `output`.
    ///
    /// Recoverable problems go to `listener`; `Err` means the run was
    /// abandoned part way and the processor state is unknown.
    fn transform(
        &mut self,
        input: &[u8],
        output: &mut dyn Write,
        listener: &mut dyn DiagnosticListener,
    ) -> Result<(), TransformError>;

    /// Clear parameters and per-run state before the processor is reused.
    fn reset(&mut self) -> Result<(), TransformError>;

    /// Install the resolver used for documents referenced by the stylesheet.
    fn set_uri_resolver(&mut self, _resolver: Box<dyn UriResolver>) {}

    /// Remove and return the currently installed resolver, if any.
    fn take_uri_resolver(&mut self) -> Option<Box<dyn UriResolver>> {
        None
    }
}

/// Compiles stylesheets into processors.
pub trait TransformEngine: Send + Sync {
    /// Compile stylesheet text.
    ///
    /// Problems found while compiling are reported to `listener` before the
    /// error is returned.
    fn compile(
        &self,
        stylesheet: &str,
        listener: &mut dyn DiagnosticListener,
    ) -> Result<Box<dyn Processor>, TransformError>;

    /// Returns the name of this engine for logging purposes.
    fn name(&self) -> &'static str;
}

/// Engine selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum EngineKind {
    #[default]
    Saxon,
    Xalan,
    Passthrough,
    /// Fully-qualified implementation identifier.
    Custom(String),
}

impl EngineKind {
    pub const SAXON_ID: &'static str = "net.sf.saxon.TransformerFactoryImpl";
    pub const XALAN_ID: &'static str = "org.apache.xalan.processor.TransformerFactoryImpl";
    pub const PASSTHROUGH_ID: &'static str = "builtin.passthrough";

    /// Parse an engine name: a case-insensitive alias or a qualified identifier.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        let name = name.trim();
        match name.to_lowercase().as_str() {
            "saxon" => Ok(EngineKind::Saxon),
            "xalan" => Ok(EngineKind::Xalan),
            "passthrough" => Ok(EngineKind::Passthrough),
            _ if name == Self::SAXON_ID => Ok(EngineKind::Saxon),
            _ if name == Self::XALAN_ID => Ok(EngineKind::Xalan),
            _ if name == Self::PASSTHROUGH_ID => Ok(EngineKind::Passthrough),
            _ if name.contains('.') => Ok(EngineKind::Custom(name.to_string())),
            _ => Err(ConfigError::UnknownEngine(name.to_string())),
        }
    }

    /// Concrete identifier used in pool keys and registry lookups.
    pub fn identifier(&self) -> &str {
        match self {
            EngineKind::Saxon => Self::SAXON_ID,
            EngineKind::Xalan => Self::XALAN_ID,
            EngineKind::Passthrough => Self::PASSTHROUGH_ID,
            EngineKind::Custom(id) => id,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Engine implementations by identifier.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Arc<dyn TransformEngine>>,
}

impl EngineRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the always-available engines.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(EngineKind::Passthrough, PassthroughEngine::new());
        registry
    }

    /// Register (or replace) the implementation for `kind`.
    pub fn register(&mut self, kind: EngineKind, engine: impl TransformEngine + 'static) {
        self.register_arc(kind, Arc::new(engine));
    }

    pub fn register_arc(&mut self, kind: EngineKind, engine: Arc<dyn TransformEngine>) {
        tracing::debug!(engine = %kind, name = engine.name(), "engine registered");
        self.engines.insert(kind.identifier().to_string(), engine);
    }

    /// Look up the implementation for `kind`.
    pub fn resolve(&self, kind: &EngineKind) -> Result<Arc<dyn TransformEngine>, ConfigError> {
        self.engines
            .get(kind.identifier())
            .cloned()
            .ok_or_else(|| ConfigError::EngineNotRegistered(kind.identifier().to_string()))
    }

    pub fn contains(&self, kind: &EngineKind) -> bool {
        self.engines.contains_key(kind.identifier())
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
