//! globetab-config — replication configuration for globally replicated tables.
//!
//! Holds the externally supplied, immutable-per-run description of which
//! tables are replicated, to which regions, and with what autoscaling
//! capacity. Also carries the two engine tunables (retry count and
//! inter-attempt pause) and the substitution policy flag.
//!
//! The config is read-only input to every phase; validation of capacity
//! bounds happens here so that a malformed config fails a run before any
//! remote call is made.

pub mod error;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use types::*;
