//! globetab-template — the shared declarative template document.
//!
//! The host owns one `TemplateDocument` per run: a set of named top-level
//! sections, one of which (`"resources"`) maps logical resource names to
//! resource definitions. Every phase mutates the document by additive
//! structural merge only; keys a phase does not touch are preserved.
//!
//! Placeholder rewriting is a typed tree-walk: a string leaf that exactly
//! equals a recognized token is replaced in place, so a value that merely
//! contains the token as a substring is never corrupted.

pub mod document;
pub mod error;
pub mod substitute;

pub use document::{ResourceFragment, TemplateDocument};
pub use error::{TemplateError, TemplateResult};
pub use substitute::{
    ResolvedRefs, SubstitutionMap, apply_substitutions, arn_token, stream_arn_token, Replacement,
};
