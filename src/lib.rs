//! faqbase: an internal FAQ and knowledge-base service.
//!
//! Questions and answers live in Postgres behind a cache-aside repository
//! with per-query expiry. Category statistics, relevance ranking and the
//! manager assistant are derived heuristically from question text.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
