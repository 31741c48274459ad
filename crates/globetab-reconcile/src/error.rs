//! Reconciler error types.

use thiserror::Error;

use globetab_provider::ProviderError;
use globetab_template::TemplateError;

/// Result type alias for reconciliation.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors that fail a reconcile run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// One table's describe or replica update failed. No retry is
    /// applied here; a single failure fails that table's work unit.
    #[error("failed to reconcile table {table}: {source}")]
    Table {
        table: String,
        source: ProviderError,
    },

    /// The table resource or its physical name is missing from the
    /// document.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A reconcile task panicked.
    #[error("reconcile task failed: {0}")]
    Task(String),
}
