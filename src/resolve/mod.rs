//! Property resolution.
//!
//! [`PropertyLinker`] merges a blueprint with overrides and expands counted
//! keys. The resulting [`Context`] resolves the remaining slots lazily: each
//! generator runs at most once per generation, on first demand, and may pull
//! sibling values through the context it receives.

mod arena;
mod context;
mod link;

pub use context::Context;
pub(crate) use context::ContextGuard;
pub use link::{PropertyLinker, evaluate_property, random_between};
