//! globetab-reconcile — replica region reconciliation.
//!
//! Runs after the infrastructure change has been applied, when every
//! table is known to exist. Per table it diffs the desired replica
//! regions against what the control plane reports and issues at most one
//! idempotent update to close the gap; a converged table is a logged
//! no-op. Tables reconcile concurrently with fail-fast aggregation:
//! siblings run to completion, the first failure fails the run.

pub mod error;
pub mod reconciler;

pub use error::{ReconcileError, ReconcileResult};
pub use reconciler::{Reconciler, WorkUnit};
