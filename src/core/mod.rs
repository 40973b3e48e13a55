//! Core host-facing types.
//!
//! - [`MessageContext`] - variable access supplied by the host
//! - [`VariableMap`] - in-memory context implementation
//! - [`Message`] / [`Variable`] - variable values
//! - [`Error`] - invocation error taxonomy
//! - [`ExecutionResult`] - two-valued outcome reported to the host
//!
//! # Example
//!
//! ```rust,ignore
//! use xslt_callout::core::{Message, MessageContext, VariableMap};
//!
//! let mut ctx = VariableMap::new().with("message", Message::new("<order id=\"7\"/>"));
//! let result = callout.execute(&mut ctx);
//! println!("{:?}", ctx.text("message.content"));
//! ```

mod context;
mod error;

pub use context::{Message, MessageContext, Variable, VariableMap};
pub use error::{Error, Result};

/// Outcome reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    Success,
    Abort,
}
