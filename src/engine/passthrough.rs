use std::io::Write;

use super::{DiagnosticListener, Processor, TransformEngine, TransformError};

/// Engine whose processors copy the input document to the output unchanged.
///
/// Useful for smoke tests and for measuring pool and cache overhead without
/// a real transform engine.
pub struct PassthroughEngine;

impl PassthroughEngine {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PassthroughEngine {
    fn default() -> Self {
        Self
    }
}

impl TransformEngine for PassthroughEngine {
    fn compile(
        &self,
        _stylesheet: &str,
        _listener: &mut dyn DiagnosticListener,
    ) -> Result<Box<dyn Processor>, TransformError> {
        Ok(Box::new(PassthroughProcessor::default()))
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

#[derive(Default)]
struct PassthroughProcessor {
    params: Vec<(String, String)>,
}

impl Processor for PassthroughProcessor {
    fn set_parameter(&mut self, name: &str, value: &str) {
        self.params.push((name.to_string(), value.to_string()));
    }

    fn transform(
        &mut self,
        input: &[u8],
        output: &mut dyn Write,
        _listener: &mut dyn DiagnosticListener,
    ) -> Result<(), TransformError> {
        output.write_all(input)?;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), TransformError> {
        self.params.clear();
        Ok(())
    }
}
