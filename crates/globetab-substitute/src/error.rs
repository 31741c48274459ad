//! Substitution engine error types.

use thiserror::Error;

use globetab_provider::ProviderError;
use globetab_template::TemplateError;

/// Result type alias for substitution.
pub type SubstituteResult<T> = Result<T, SubstituteError>;

/// Errors that abort a substitution run.
#[derive(Debug, Error)]
pub enum SubstituteError {
    /// A table's ARN lookup failed (after the retry budget, in retry
    /// mode; on a terminal error, in fallback mode).
    #[error("failed to resolve ARNs for table {table}: {source}")]
    Lookup {
        table: String,
        source: ProviderError,
    },

    /// The table resource or its physical name is missing from the
    /// document.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A lookup task panicked.
    #[error("lookup task failed: {0}")]
    Task(String),
}
