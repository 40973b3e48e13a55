//! Callout execution.
//!
//! A [`Callout`] is built once from host properties and executed for every
//! request. Each execution:
//!
//! 1. expands placeholders in the stylesheet and engine properties and
//!    dereferences `file://` and URL references through the runtime caches
//! 2. derives the pool key from engine identifier and stylesheet text
//! 3. borrows a processor, compiling one if the key has none idle
//! 4. binds `param_*` properties, reads the input, runs the transform
//! 5. publishes the result or the error variables
//! 6. returns the processor to the pool, or discards it after an abort
//!
//! Nothing escapes to the host: every failure ends up in `xslt_*` variables
//! and an [`ExecutionResult::Abort`].

mod processor;
mod properties;

pub use processor::PooledProcessor;
pub use properties::CalloutConfig;

use processor::panic_message;

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::core::{Error, ExecutionResult, MessageContext, Result, Variable};
use crate::engine::{DiagnosticCollector, EngineKind};
use crate::resolver;
use crate::runtime::CalloutRuntime;

/// Prefix of every variable the callout writes besides the output.
pub const VAR_PREFIX: &str = "xslt_";

/// Separates engine identifier and stylesheet text in a pool key.
const KEY_SEPARATOR: char = '\u{1F}';

/// Pool key for an engine and dereferenced stylesheet text.
pub fn pool_key(engine: &EngineKind, stylesheet: &str) -> String {
    let id = engine.identifier();
    let mut key = String::with_capacity(id.len() + 1 + stylesheet.len());
    key.push_str(id);
    key.push(KEY_SEPARATOR);
    key.push_str(stylesheet);
    key
}

/// Whether text looks like a stylesheet document (closing `stylesheet` or
/// `transform` root element).
fn looks_like_stylesheet(text: &str) -> bool {
    let text = text.trim();
    text.starts_with('<') && (text.ends_with("stylesheet>") || text.ends_with("transform>"))
}

fn var_name(suffix: &str) -> String {
    format!("{}{}", VAR_PREFIX, suffix)
}

/// Per-request state, never shared.
struct InvocationContext {
    id: Uuid,
    debug: bool,
    started: Instant,
    diagnostics: Option<DiagnosticCollector>,
}

impl InvocationContext {
    fn new(debug: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            debug,
            started: Instant::now(),
            diagnostics: None,
        }
    }
}

/// Engine and stylesheet after placeholder expansion and dereferencing.
struct ResolvedSource {
    engine: EngineKind,
    stylesheet: Arc<str>,
}

/// A configured transform step.
pub struct Callout {
    config: std::result::Result<CalloutConfig, ConfigError>,
    runtime: Arc<CalloutRuntime>,
}

impl Callout {
    /// Build from host properties.
    ///
    /// Invalid properties don't prevent construction; every execution then
    /// aborts with the configuration error.
    pub fn new(properties: &HashMap<String, String>, runtime: Arc<CalloutRuntime>) -> Self {
        let config = CalloutConfig::from_properties(properties);
        if let Err(e) = &config {
            tracing::warn!(error = %e, "callout misconfigured");
        }
        Self { config, runtime }
    }

    /// Validated properties, or the reason they were rejected.
    pub fn config(&self) -> std::result::Result<&CalloutConfig, &ConfigError> {
        self.config.as_ref()
    }

    pub fn runtime(&self) -> &Arc<CalloutRuntime> {
        &self.runtime
    }

    /// Run the transform against the host context.
    pub fn execute(&self, ctx: &mut dyn MessageContext) -> ExecutionResult {
        let debug = self.config.as_ref().is_ok_and(CalloutConfig::debug);
        let mut invocation = InvocationContext::new(debug);

        let outcome = self.invoke(&mut invocation, &*ctx);

        if let Some(collector) = invocation.diagnostics.take() {
            publish_diagnostics(ctx, &collector);
        }

        let elapsed = invocation.started.elapsed().as_secs_f64();
        match outcome {
            Ok(result) => {
                if let Ok(config) = &self.config {
                    ctx.set_variable(config.output(), Variable::Text(result));
                }
                self.runtime.metrics().record_invocation("success", elapsed);
                tracing::debug!(
                    invocation_id = %invocation.id,
                    elapsed_ms = elapsed * 1000.0,
                    "transform succeeded"
                );
                ExecutionResult::Success
            }
            Err(error) => {
                self.runtime.metrics().record_invocation(error.kind(), elapsed);
                if invocation.debug {
                    tracing::warn!(invocation_id = %invocation.id, kind = error.kind(), error = %error, "transform failed");
                } else {
                    tracing::debug!(invocation_id = %invocation.id, kind = error.kind(), error = %error, "transform failed");
                }
                publish_error(ctx, &error);
                ExecutionResult::Abort
            }
        }
    }

    fn invoke(&self, invocation: &mut InvocationContext, ctx: &dyn MessageContext) -> Result<String> {
        let config = self.config.as_ref().map_err(|e| Error::Config(e.clone()))?;

        let resolved = self.resolve_source(config, ctx)?;
        let key = pool_key(&resolved.engine, &resolved.stylesheet);

        let pool = self.runtime.pool();
        let mut processor = pool.borrow(&key, || self.construct(&resolved))?;
        tracing::trace!(
            invocation_id = %invocation.id,
            engine = processor.engine(),
            runs = processor.runs(),
            "processor borrowed"
        );

        processor.attach(DiagnosticCollector::new(invocation.debug));
        let outcome = self.run(&mut processor, config, ctx);
        invocation.diagnostics = processor.take_diagnostics();

        match &outcome {
            Err(e) if !e.leaves_processor_reusable() => {
                pool.discard(&key, processor);
                self.runtime.metrics().inc_discarded();
            }
            _ => pool.give_back(&key, processor, PooledProcessor::passivate),
        }
        outcome
    }

    /// Expand and dereference the stylesheet and engine properties.
    fn resolve_source(&self, config: &CalloutConfig, ctx: &dyn MessageContext) -> Result<ResolvedSource> {
        let lookup = |name: &str| ctx.get_text(name);

        let xslt = resolver::resolve(config.xslt(), lookup);
        let xslt = xslt.trim();
        if xslt.is_empty() {
            return Err(ConfigError::ResolvesEmpty { key: "xslt".into() }.into());
        }
        let stylesheet = self.runtime.dereference(xslt)?;
        if !looks_like_stylesheet(&stylesheet) {
            return Err(ConfigError::InvalidXslt.into());
        }

        let engine = resolver::resolve(config.engine(), lookup);
        if engine.trim().is_empty() {
            return Err(ConfigError::ResolvesEmpty { key: "engine".into() }.into());
        }
        let engine = EngineKind::parse(&engine)?;

        Ok(ResolvedSource { engine, stylesheet })
    }

    fn construct(&self, resolved: &ResolvedSource) -> Result<PooledProcessor> {
        let engine = self.runtime.engines().resolve(&resolved.engine)?;
        let processor = PooledProcessor::construct(engine.as_ref(), &resolved.stylesheet)?;
        self.runtime.metrics().inc_constructed();
        Ok(processor)
    }

    /// Bind parameters, read the input and run the borrowed processor.
    fn run(
        &self,
        processor: &mut PooledProcessor,
        config: &CalloutConfig,
        ctx: &dyn MessageContext,
    ) -> Result<String> {
        let mut bindings = Vec::with_capacity(config.params().len());
        for (name, raw) in config.params() {
            let value = resolver::resolve(raw, |var| ctx.get_text(var));
            bindings.push((name.as_str(), self.runtime.dereference(&value)?));
        }

        let input = read_input(ctx, config.input())?;

        let output = panic::catch_unwind(AssertUnwindSafe(|| {
            for (name, value) in &bindings {
                processor.set_parameter(name, value);
            }
            processor.run(&input)
        }))
        .map_err(|payload| Error::Defect(panic_message(payload.as_ref())))?
        .map_err(|e| Error::Execution(e.message))?;

        let error_count = processor.error_count();
        if error_count > 0 {
            return Err(Error::Diagnostics { error_count });
        }

        Ok(String::from_utf8_lossy(&output).trim().to_string())
    }
}

/// Document bytes from the input variable.
fn read_input(ctx: &dyn MessageContext, name: &str) -> Result<Bytes> {
    match ctx.get_variable(name) {
        None => Err(ConfigError::Input("input is not specified".into()).into()),
        Some(Variable::Message(message)) => Ok(message.content().clone()),
        Some(Variable::Text(text)) => {
            let text = text.trim();
            if !text.starts_with('<') {
                return Err(ConfigError::Input("input does not appear to be XML".into()).into());
            }
            Ok(Bytes::copy_from_slice(text.as_bytes()))
        }
    }
}

fn publish_error(ctx: &mut dyn MessageContext, error: &Error) {
    ctx.set_variable(&var_name("exception"), Variable::Text(error.to_string()));
    ctx.set_variable(&var_name("error"), Variable::Text(error.short_message()));
    if let Some(info) = error.additional_information() {
        ctx.set_variable(
            &var_name("additionalInformation"),
            Variable::Text(info.to_string()),
        );
    }
}

fn publish_diagnostics(ctx: &mut dyn MessageContext, collector: &DiagnosticCollector) {
    for diagnostic in collector.diagnostics() {
        ctx.set_variable(&var_name(&diagnostic.name()), Variable::Text(diagnostic.value()));
    }
    if collector.error_count() > 0 {
        ctx.set_variable(
            &var_name("error_count"),
            Variable::Text(collector.error_count().to_string()),
        );
    }
}
