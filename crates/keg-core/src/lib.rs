//! Core library for keg.
//!
//! A formula is a declarative record: a source URL, a content hash, the
//! build-time tools it needs, and a couple of smoke checks against the
//! installed binary. This crate implements the stages a formula flows
//! through, each as its own module:
//!
//! ```text
//! formula -> fetch (verify sha256) -> builder -> smoke
//! ```
//!
//! Every stage is terminal: the first failure aborts the whole install and
//! surfaces a stage-specific error. There is no retry or rollback; scoped
//! temp directories own all intermediate state.

pub mod builder;
pub mod extract;
pub mod fetch;
pub mod formula;
pub mod paths;
pub mod receipt;
pub mod reporter;
pub mod smoke;

pub use reporter::{NullReporter, Reporter};

/// User agent sent with every outbound HTTP request.
pub const USER_AGENT: &str = concat!("keg/", env!("CARGO_PKG_VERSION"));
