//! Error types for slide rendering.
//!
//! This module provides [`RenderError`], the error type for every fallible
//! rendering operation. It hides the errors of the underlying markdown,
//! highlighting and template crates behind a stable public API.
//!
//! Most failures in this crate are recoverable by design of the rendering
//! flow: a broken frontmatter block yields empty metadata, a failing template
//! falls back to the plain render tree. `RenderError` is what gets reported to
//! error handlers and logs along those fallback paths.

use std::fmt;

use crate::host::HostError;

/// Error type for slide rendering operations.
#[derive(Debug)]
pub enum RenderError {
    /// Template syntax error or compilation failure.
    TemplateError(String),

    /// Template not found (unresolvable layout path).
    TemplateNotFound(String),

    /// Data serialization error (frontmatter, template context, config).
    SerializationError(String),

    /// A pipeline stage failed.
    StageError {
        /// Name of the failing stage.
        stage: String,
        /// What went wrong.
        message: String,
    },

    /// Syntax highlighting failure.
    HighlightError(String),

    /// A host request failed.
    HostError(HostError),

    /// I/O error (e.g., reading a config file from disk).
    IoError(std::io::Error),
}

impl RenderError {
    /// Creates a [`RenderError::StageError`] for the named stage.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::StageError {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TemplateError(msg) => write!(f, "template error: {}", msg),
            RenderError::TemplateNotFound(name) => write!(f, "template not found: {}", name),
            RenderError::SerializationError(msg) => write!(f, "serialization error: {}", msg),
            RenderError::StageError { stage, message } => {
                write!(f, "stage '{}' failed: {}", stage, message)
            }
            RenderError::HighlightError(msg) => write!(f, "highlight error: {}", msg),
            RenderError::HostError(err) => write!(f, "host error: {}", err),
            RenderError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::IoError(err) => Some(err),
            RenderError::HostError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::IoError(err)
    }
}

impl From<HostError> for RenderError {
    fn from(err: HostError) -> Self {
        RenderError::HostError(err)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for RenderError {
    fn from(err: serde_yaml::Error) -> Self {
        RenderError::SerializationError(err.to_string())
    }
}

impl From<syntect::Error> for RenderError {
    fn from(err: syntect::Error) -> Self {
        RenderError::HighlightError(err.to_string())
    }
}

impl From<handlebars::TemplateError> for RenderError {
    fn from(err: handlebars::TemplateError) -> Self {
        RenderError::TemplateError(err.to_string())
    }
}

impl From<handlebars::RenderError> for RenderError {
    fn from(err: handlebars::RenderError) -> Self {
        RenderError::TemplateError(err.to_string())
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::TemplateNotFound(err.to_string()),
            ErrorKind::BadSerialization => RenderError::SerializationError(err.to_string()),
            _ => RenderError::TemplateError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RenderError::TemplateNotFound("layouts/intro.html".to_string());
        assert!(err.to_string().contains("template not found"));
        assert!(err.to_string().contains("layouts/intro.html"));
    }

    #[test]
    fn test_stage_error_display() {
        let err = RenderError::stage("highlight", "unknown theme");
        assert_eq!(err.to_string(), "stage 'highlight' failed: unknown theme");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let render_err: RenderError = io_err.into();
        assert!(matches!(render_err, RenderError::IoError(_)));
    }

    #[test]
    fn test_from_minijinja_syntax_error() {
        let mj_err = minijinja::Error::new(minijinja::ErrorKind::SyntaxError, "unexpected end");
        let render_err: RenderError = mj_err.into();
        assert!(matches!(render_err, RenderError::TemplateError(_)));
    }

    #[test]
    fn test_from_handlebars_template_error() {
        let hbs_err = handlebars::Handlebars::new()
            .register_template_string("broken", "{{#if x}}")
            .unwrap_err();
        let render_err: RenderError = hbs_err.into();
        assert!(matches!(render_err, RenderError::TemplateError(_)));
    }

    #[test]
    fn test_from_host_error_keeps_source() {
        use std::error::Error;

        let render_err: RenderError = HostError::Closed.into();
        assert!(render_err.source().is_some());
    }
}
