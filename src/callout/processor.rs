//! Pooled processor wrapper.

use std::panic::{self, AssertUnwindSafe};

use crate::core::Error;
use crate::engine::{
    DataUriResolver, DiagnosticCollector, LastErrorListener, Processor, TransformEngine,
    TransformError,
};

/// A compiled processor plus the diagnostic slot of the invocation using it.
pub struct PooledProcessor {
    processor: Box<dyn Processor>,
    engine: &'static str,
    listener: Option<DiagnosticCollector>,
    runs: u64,
}

impl PooledProcessor {
    /// Compile `stylesheet` with `engine`.
    ///
    /// The last error the engine reports while compiling becomes the
    /// failure's additional information. A panic while compiling or while
    /// installing the URI resolver is a defect.
    pub fn construct(engine: &dyn TransformEngine, stylesheet: &str) -> Result<Self, Error> {
        let mut compile_listener = LastErrorListener::new();
        let compiled = panic::catch_unwind(AssertUnwindSafe(|| {
            engine.compile(stylesheet, &mut compile_listener)
        }))
        .map_err(|payload| Error::Defect(panic_message(payload.as_ref())))?;

        let mut processor = compiled.map_err(|e| Error::Construction {
            message: e.message,
            additional_information: compile_listener.into_last_error(),
        })?;

        panic::catch_unwind(AssertUnwindSafe(|| {
            let fallback = processor.take_uri_resolver();
            processor.set_uri_resolver(Box::new(DataUriResolver::new(fallback)));
        }))
        .map_err(|payload| Error::Defect(panic_message(payload.as_ref())))?;

        tracing::debug!(engine = engine.name(), "processor constructed");
        Ok(Self {
            processor,
            engine: engine.name(),
            listener: None,
            runs: 0,
        })
    }

    /// Install the collector for the current invocation.
    pub fn attach(&mut self, listener: DiagnosticCollector) {
        self.listener = Some(listener);
    }

    pub fn set_parameter(&mut self, name: &str, value: &str) {
        self.processor.set_parameter(name, value);
    }

    /// Transform `input` into a buffer, reporting to the attached collector.
    pub fn run(&mut self, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let listener = self.listener.get_or_insert_with(DiagnosticCollector::default);
        let mut output = Vec::new();
        self.runs += 1;
        self.processor.transform(input, &mut output, listener)?;
        Ok(output)
    }

    /// Errors recorded by the attached collector.
    pub fn error_count(&self) -> usize {
        self.listener.as_ref().map_or(0, DiagnosticCollector::error_count)
    }

    /// Detach the collector.
    pub fn take_diagnostics(&mut self) -> Option<DiagnosticCollector> {
        self.listener.take()
    }

    /// Clear the listener slot and the processor's parameters before pooling.
    ///
    /// A panicking reset is reported as a failed one.
    pub fn passivate(&mut self) -> Result<(), TransformError> {
        self.listener = None;
        let processor = &mut self.processor;
        panic::catch_unwind(AssertUnwindSafe(|| processor.reset())).unwrap_or_else(|payload| {
            Err(format!("reset panicked: {}", panic_message(payload.as_ref())).into())
        })
    }

    /// Engine name, for logging.
    pub fn engine(&self) -> &'static str {
        self.engine
    }

    /// Completed or attempted runs over this instance's lifetime.
    pub fn runs(&self) -> u64 {
        self.runs
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "engine panicked".to_string()
    }
}
