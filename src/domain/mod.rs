//! Domain layer types, invariants, and the text heuristics built on them.

pub mod categories;
pub mod entities;
pub mod error;
pub mod questions;
pub mod scoring;
pub mod text;
