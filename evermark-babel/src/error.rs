//! Error types for note conversion
//!
//! Anomalies inside a note become [`crate::diagnostics::Diagnostic`]s.
//! These errors only cover notes that cannot be converted at all.

use thiserror::Error;

/// Errors that can occur before a note reaches the conversion engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    /// The HTML could not be read into a DOM
    #[error("Parse error: {0}")]
    ParseError(String),
    /// The document has no `<body>` to convert
    #[error("No content found in '{0}'")]
    MissingBody(String),
    /// The metadata could not be written as YAML
    #[error("Frontmatter error: {0}")]
    Frontmatter(String),
}

impl From<serde_yaml::Error> for ConvertError {
    fn from(err: serde_yaml::Error) -> Self {
        ConvertError::Frontmatter(err.to_string())
    }
}
