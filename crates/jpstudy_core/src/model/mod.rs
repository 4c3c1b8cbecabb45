//! Domain records shared by the cache, resolver and pipeline.
//!
//! # Responsibility
//! - Define the canonical item record fetched from the external item source.
//! - Define sentence-level input/output records of the pipeline.
//!
//! # Invariants
//! - Every item is identified by a stable positive `SubjectId`.
//! - Item records are immutable reference data once fetched.

pub mod item;
pub mod sentence;
