//! globetab-autoscale — autoscaling artifact synthesis.
//!
//! A pure function from capacity configuration to a declarative resource
//! fragment: per replicated table and per configured dimension (Read,
//! Write) one scalable target and one target-tracking scaling policy,
//! plus a single shared scaling role per run. No remote I/O — the only
//! failure mode is malformed input, which fails the whole synthesis
//! before anything is merged.
//!
//! # Dependency edges
//!
//! ```text
//! ScalingRole ──────────────┐            (DependsOn all tables when every
//!                           │             physical name is still pending)
//! <Table>AutoScalableTarget<Dim>
//!   ├── DependsOn ScalingRole
//!   └── DependsOn <Table>           (primary region only)
//! <Table>AutoScalingPolicy<Dim>
//!   └── DependsOn its target (+ <Table> in the primary region)
//! ```

pub mod error;
pub mod synthesizer;

pub use error::{SynthesisError, SynthesisResult};
pub use synthesizer::{synthesize, Dimension};
