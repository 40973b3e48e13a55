//! Diagnostic listeners.
//!
//! Engines report warnings and errors through a [`DiagnosticListener`]
//! instead of failing immediately. Listeners only record; what to do with
//! the record is decided after the run.

use super::TransformError;

/// Callback interface engines report diagnostics through.
pub trait DiagnosticListener {
    /// Recoverable condition.
    fn warning(&mut self, error: &TransformError);

    /// Error the engine recovered from well enough to keep going.
    fn error(&mut self, error: &TransformError);

    /// Error the engine could not recover from.
    fn fatal(&mut self, error: &TransformError);
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// Prefix used when a diagnostic is published to the host.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Fatal => "Fatal Error",
        }
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// 1-based position within its sequence (errors and warnings are numbered separately).
    pub ordinal: usize,
}

impl Diagnostic {
    /// Variable suffix, e.g. `error_2` or `warning_1`.
    pub fn name(&self) -> String {
        match self.severity {
            Severity::Warning => format!("warning_{}", self.ordinal),
            Severity::Error | Severity::Fatal => format!("error_{}", self.ordinal),
        }
    }

    /// Published value, e.g. `Error:undeclared variable $x`.
    pub fn value(&self) -> String {
        format!("{}:{}", self.severity.label(), self.message)
    }
}

/// Per-invocation append-only diagnostic log.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    debug: bool,
    log: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl DiagnosticCollector {
    /// Create an empty collector. In debug mode every diagnostic is also logged.
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }

    /// Errors recorded so far (fatal errors included).
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    /// Diagnostics in arrival order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.log
    }

    fn record(&mut self, severity: Severity, error: &TransformError) {
        let ordinal = match severity {
            Severity::Warning => {
                self.warnings += 1;
                self.warnings
            }
            Severity::Error | Severity::Fatal => {
                self.errors += 1;
                self.errors
            }
        };

        if self.debug {
            match severity {
                Severity::Warning => {
                    tracing::warn!(ordinal, message = %error, "transform warning")
                }
                Severity::Error | Severity::Fatal => {
                    tracing::warn!(ordinal, severity = severity.label(), message = %error, "transform error")
                }
            }
        }

        self.log.push(Diagnostic {
            severity,
            message: error.to_string(),
            ordinal,
        });
    }
}

impl DiagnosticListener for DiagnosticCollector {
    fn warning(&mut self, error: &TransformError) {
        self.record(Severity::Warning, error);
    }

    fn error(&mut self, error: &TransformError) {
        self.record(Severity::Error, error);
    }

    fn fatal(&mut self, error: &TransformError) {
        self.record(Severity::Fatal, error);
    }
}

/// Compile-time listener keeping only the most recent error. Last write wins.
#[derive(Debug, Default)]
pub struct LastErrorListener {
    last_error: Option<String>,
}

impl LastErrorListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent error or fatal error message.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn into_last_error(self) -> Option<String> {
        self.last_error
    }
}

impl DiagnosticListener for LastErrorListener {
    fn warning(&mut self, _error: &TransformError) {}

    fn error(&mut self, error: &TransformError) {
        self.last_error = Some(error.to_string());
    }

    fn fatal(&mut self, error: &TransformError) {
        self.last_error = Some(error.to_string());
    }
}
