//! Recognition tasks and their model instructions

use std::fmt;

/// Recognition task type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Plain text content
    Text,
    /// Formula as LaTeX
    Formula,
    /// Table as HTML
    Table,
}

impl Default for Task {
    fn default() -> Self {
        Self::Text
    }
}

impl Task {
    /// Look up a task by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "formula" => Some(Self::Formula),
            "table" => Some(Self::Table),
            _ => None,
        }
    }

    /// Look up a task by name, falling back to [`Task::Text`]
    pub fn resolve(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!("Unknown task '{}', using text instruction", name);
            Self::default()
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Formula => "formula",
            Self::Table => "table",
        }
    }

    /// Instruction sent to the model alongside each image
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Text => "Please output the text content from the image.",
            Self::Formula => "Please write out the expression of the formula in the image using LaTeX format.",
            Self::Table => "This is the image of a table. Please output the table in html format.",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
