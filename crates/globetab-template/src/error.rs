//! Template document error types.

use thiserror::Error;

/// Result type alias for template document operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors raised while reading the template document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// No resource with the given logical name exists in the document.
    #[error("resource not found in template: {0}")]
    MissingResource(String),

    /// The resource exists but carries no physical table name.
    #[error("resource {0} has no Properties.TableName")]
    MissingTableName(String),
}
