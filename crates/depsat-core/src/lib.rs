//! Core data types for depsat.
//!
//! This crate defines the version specifier model shared by the registry,
//! resolver and solver, the npm range grammar behind it, user configuration,
//! and `package.json` reading.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod config;
pub mod manifest;
pub mod range;
pub mod specifier;

pub use range::VersionRange;
pub use specifier::Specifier;
