//! Parameterised SQL commands.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// SQL command text plus its positional parameter values.
///
/// A `SqlQuery` is an immutable value: builders produce new instances rather than
/// mutating existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlQuery {
    command_text: String,
    arguments: Vec<Value>,
}

impl SqlQuery {
    /// Create a query from command text and ordered arguments.
    pub fn new(command_text: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            command_text: command_text.into(),
            arguments,
        }
    }

    /// Create a query without parameters.
    pub fn text(command_text: impl Into<String>) -> Self {
        Self::new(command_text, Vec::new())
    }

    /// The SQL command text.
    pub fn command_text(&self) -> &str {
        &self.command_text
    }

    /// The positional arguments.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Number of positional arguments.
    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    /// True if the command text is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.command_text.trim().is_empty()
    }

    /// Split into text and arguments.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.command_text, self.arguments)
    }
}

impl std::fmt::Display for SqlQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.command_text)
    }
}
