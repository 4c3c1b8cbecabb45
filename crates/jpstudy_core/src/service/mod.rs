//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate annotation, extraction and level resolution for callers.
//! - Keep CLI layers decoupled from cache and storage details.

pub mod pipeline;
