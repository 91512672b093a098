//! Application services layer.

pub mod access;
pub mod analysis;
pub mod assistant;
pub mod error;
pub mod knowledge_base;
pub mod questions;
pub mod repos;
