//! globetab-provider — the seam to the table service control plane.
//!
//! The rest of the system never talks to a concrete transport; it takes a
//! `dyn TableService` exposing the two idempotent operations the control
//! plane is assumed to provide:
//!
//! - `describe_table` — physical ARNs and the currently reported replica
//!   regions of an existing table
//! - `update_table_replicas` — request replica creation in a set of regions
//!
//! Failures are classified as retryable (`NotFound`, `Throttled`,
//! `Transient`, `Conflict`) or terminal (`AccessDenied`); the fixed-pause
//! `with_retry` helper honors that classification.
//!
//! `MemoryTableService` is a scripted in-memory implementation for tests,
//! shipped in the crate the same way the durable stores in this workspace
//! ship their in-memory constructors.

pub mod client;
pub mod error;
pub mod memory;
pub mod retry;

pub use client::{TableDescription, TableService};
pub use error::{ProviderError, ProviderResult};
pub use memory::MemoryTableService;
pub use retry::with_retry;
