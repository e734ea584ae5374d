use crate::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub suggestions: Vec<String>,
    pub source_context: Option<String>,
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
            suggestions: Vec::new(),
            source_context: None,
            code: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
            suggestions: Vec::new(),
            source_context: None,
            code: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source_context(mut self, context: impl Into<String>) -> Self {
        self.source_context = Some(context.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }

    /// Render as plain text lines, one header line followed by one line per suggestion.
    pub fn render_plain(&self) -> Vec<String> {
        let level = match self.level {
            DiagnosticLevel::Error => "ERROR",
            DiagnosticLevel::Warning => "WARNING",
            DiagnosticLevel::Info => "INFO",
        };
        let context = self.source_context.as_deref().unwrap_or("resolve");

        let header = match self.code.as_ref() {
            Some(code) => format!("[{}] {}: {} ({})", context, level, self.message, code),
            None => format!("[{}] {}: {}", context, level, self.message),
        };

        let mut lines = vec![header];
        for suggestion in &self.suggestions {
            lines.push(format!("   suggestion: {}", suggestion));
        }
        lines
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        let mut diagnostic = Diagnostic::error(err.to_string());
        if let Some(code) = err.code_text() {
            diagnostic = diagnostic.with_code(code);
        }
        if let Some(help) = err.help_text() {
            diagnostic = diagnostic.with_suggestion(help);
        }
        diagnostic
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }

        if !self.suggestions.is_empty() {
            let hints = self.suggestions.join("; ");
            write!(f, " (hints: {})", hints)?;
        }

        Ok(())
    }
}
