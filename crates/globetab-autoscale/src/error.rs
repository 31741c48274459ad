//! Synthesis error types.

use thiserror::Error;

use globetab_config::ConfigError;
use globetab_template::TemplateError;

/// Result type alias for synthesis.
pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Errors that fail a synthesis run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SynthesisError {
    /// A table's capacity config is malformed.
    #[error("invalid {dimension} capacity for table {table}: {source}")]
    Capacity {
        table: String,
        dimension: &'static str,
        source: ConfigError,
    },

    /// The table resource or its physical name is missing from the
    /// document in a region that requires it.
    #[error(transparent)]
    Template(#[from] TemplateError),
}
