//! Host message context.
//!
//! The host hands each invocation a [`MessageContext`]: a bag of named
//! variables that supplies the input document and placeholder values and
//! receives the output and error variables.

use std::collections::HashMap;

use bytes::Bytes;

/// Suffix addressing the content of a message variable, as in `message.content`.
const CONTENT_SUFFIX: &str = ".content";

/// A structured message flowing through the host pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    content: Bytes,
}

impl Message {
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Raw content.
    #[inline]
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Content as text (invalid UTF-8 replaced).
    pub fn content_text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }

    pub fn set_content(&mut self, content: impl Into<Bytes>) {
        self.content = content.into();
    }
}

/// A context variable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variable {
    Text(String),
    Message(Message),
}

impl Variable {
    /// Text view used for placeholder substitution.
    pub fn to_text(&self) -> String {
        match self {
            Variable::Text(s) => s.clone(),
            Variable::Message(m) => m.content_text(),
        }
    }
}

impl From<String> for Variable {
    fn from(s: String) -> Self {
        Variable::Text(s)
    }
}

impl From<&str> for Variable {
    fn from(s: &str) -> Self {
        Variable::Text(s.to_string())
    }
}

impl From<Message> for Variable {
    fn from(m: Message) -> Self {
        Variable::Message(m)
    }
}

/// Host-side variable access for one invocation.
pub trait MessageContext {
    /// Read a variable.
    fn get_variable(&self, name: &str) -> Option<Variable>;

    /// Write a variable, replacing any previous value.
    fn set_variable(&mut self, name: &str, value: Variable);

    /// Text view of a variable, for placeholder substitution.
    fn get_text(&self, name: &str) -> Option<String> {
        self.get_variable(name).map(|v| v.to_text())
    }
}

/// In-memory [`MessageContext`].
///
/// `<name>.content` reads and writes the content of message variable
/// `<name>` when one exists.
#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    values: HashMap<String, Variable>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<Variable>) -> Self {
        self.set_variable(name, value.into());
        self
    }

    /// Text value of a variable, if it is set.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get_text(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_variable(name).is_some()
    }

    /// Names of directly stored variables.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    fn message_for_content<'a>(&self, name: &'a str) -> Option<&'a str> {
        let base = name.strip_suffix(CONTENT_SUFFIX)?;
        matches!(self.values.get(base), Some(Variable::Message(_))).then_some(base)
    }
}

impl MessageContext for VariableMap {
    fn get_variable(&self, name: &str) -> Option<Variable> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        let base = self.message_for_content(name)?;
        match self.values.get(base) {
            Some(Variable::Message(m)) => Some(Variable::Text(m.content_text())),
            _ => None,
        }
    }

    fn set_variable(&mut self, name: &str, value: Variable) {
        if let Some(base) = self.message_for_content(name).map(str::to_string) {
            if let Some(Variable::Message(m)) = self.values.get_mut(&base) {
                match value {
                    Variable::Text(s) => m.set_content(s),
                    Variable::Message(other) => m.set_content(other.content().clone()),
                }
                return;
            }
        }
        self.values.insert(name.to_string(), value);
    }
}
