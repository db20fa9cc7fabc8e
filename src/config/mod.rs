//! # capdb Configuration Module
//!
//! This module centralizes the configuration constants for capdb. Constants are
//! grouped by functional area and interdependencies are enforced through
//! compile-time assertions.
//!
//! Runtime knobs (lock timeout, poll interval, per-document cap) live on
//! [`crate::engine::EngineConfig`] and default to the values defined here.
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation

pub mod constants;
pub use constants::*;
