//! Shared utilities for depsat.
//!
//! This crate provides the cross-cutting concerns used by the other depsat
//! crates: the unified diagnostic error type and Cargo-style terminal status
//! and progress indicators.

pub mod errors;
pub mod progress;
