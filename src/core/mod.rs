//! Pipeline stages and shared types for schemasplit.
//!
//! Stages run leaf-first: `extract` -> `buckets` -> `partition` (module
//! bodies) -> `deps` -> `imports` -> `emit`.

pub mod buckets;
pub mod catalog;
pub mod deps;
pub mod diag;
pub mod emit;
pub mod error;
pub mod extract;
pub mod imports;
pub mod partition;
