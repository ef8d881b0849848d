//! Shared types for keg formulas.
//!
//! This crate holds the identifier newtypes used across the workspace:
//! [`FormulaName`], [`Version`], and [`Sha256Digest`]. Keeping them in a
//! leaf crate lets both the core pipeline and the CLI speak the same
//! type-safe vocabulary without depending on each other.

pub mod types;

pub use types::{DigestError, FormulaName, Sha256Digest, Version};
