//! globetab-substitute — the reference substitution engine.
//!
//! Replicated tables are created once, in their primary region; every
//! other region's deployment needs the table's real ARN and stream ARN,
//! which cannot be known until the table exists. The engine resolves
//! those identities (concurrently, one lookup per table, with the
//! configured retry policy), then rewrites the template document wherever
//! the user embedded a `sub<Table>Arn` / `sub<Table>StreamArn`
//! placeholder. In the primary region the table is part of the same
//! deployment, so placeholders resolve to deferred intrinsic references
//! instead of literal ARNs.

pub mod engine;
pub mod error;

pub use engine::SubstitutionEngine;
pub use error::{SubstituteError, SubstituteResult};
