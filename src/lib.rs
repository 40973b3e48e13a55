//! xslt_callout - pooled XSLT transform step for request pipelines.
//!
//! Compiling a stylesheet is expensive; running a compiled one is cheap.
//! This crate keeps compiled processors in a keyed pool and stylesheet text
//! in time- and size-bounded caches so a host can run configured transforms
//! on every request without recompiling.
//!
//! # Features
//!
//! - **Keyed processor pool**: per engine and stylesheet, bounded idle set,
//!   unbounded growth under contention
//! - **Resource caches**: `file://` and `http(s)://` stylesheets and
//!   parameters, LRU with sliding TTL and single-flight loading
//! - **Placeholders**: `{variable}` expansion in properties
//! - **Diagnostics**: engine warnings and errors published as `xslt_*`
//!   variables
//! - **Observability**: JSON logging via tracing, Prometheus metrics
//!
//! # Architecture
//!
//! The transform engine is pluggable through [`engine::TransformEngine`]:
//!
//! - `PassthroughEngine` - copies input to output, always registered
//! - host engines - registered for `saxon`, `xalan`, or any qualified name
//!
//! # Example
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use xslt_callout::{Callout, CalloutRuntime, EngineRegistry, Settings};
//! use xslt_callout::core::{Message, VariableMap};
//!
//! let settings = Settings::from_env()?;
//! xslt_callout::logging::init(&settings.logging);
//! let runtime = Arc::new(CalloutRuntime::new(&settings, EngineRegistry::with_builtins())?);
//!
//! let mut properties = HashMap::new();
//! properties.insert("xslt".to_string(), "file://order.xsl".to_string());
//! properties.insert("param_currency".to_string(), "{request.currency}".to_string());
//! let callout = Callout::new(&properties, runtime);
//!
//! let mut ctx = VariableMap::new().with("message", Message::new("<order/>"));
//! let result = callout.execute(&mut ctx);
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cache;
pub mod callout;
pub mod config;
pub mod core;
pub mod engine;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod resolver;
pub mod runtime;

// Re-exports for convenience
pub use callout::{Callout, CalloutConfig};
pub use config::Settings;
pub use core::{ExecutionResult, MessageContext};
pub use engine::{EngineKind, EngineRegistry};
pub use runtime::CalloutRuntime;
