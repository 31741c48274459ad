//! globetab — multi-region replication phases for a managed key-value
//! table service deployment.
//!
//! A deployment host that wants its tables globally replicated runs the
//! three phases in strict order against one shared [`TemplateDocument`]:
//!
//! 1. **`prepare_template`** — resolve cross-region table identities and
//!    splice them into the document (`globetab-substitute`)
//! 2. **`compile_artifacts`** — synthesize autoscaling resources and merge
//!    them into the resource graph (`globetab-autoscale`)
//! 3. **`post_deploy`** — converge each table's actual replica regions
//!    toward the configured set (`globetab-reconcile`)
//!
//! The phases never run concurrently with each other; each fans out
//! per-table work internally. Everything durable lives in the remote
//! control plane — the only state here is the document the host owns.

pub mod pipeline;

pub use pipeline::{Pipeline, PipelineError, PipelineResult};

pub use globetab_config::{
    CapacityConfig, GlobalTableConfig, RegionId, ReplicationConfig, RetryPolicy, ScheduledAction,
    SubstitutionMode,
};
pub use globetab_provider::{ProviderError, TableDescription, TableService};
pub use globetab_reconcile::WorkUnit;
pub use globetab_template::TemplateDocument;
