//! npm registry metadata for depsat: packument parsing, metadata sources
//! (HTTP registry and offline snapshot), and the memoizing provider the
//! resolver crawls through.

pub mod error;
pub mod npm;
pub mod packument;
pub mod provider;
pub mod snapshot;
pub mod source;

pub use error::RegistryError;
pub use provider::{MetadataProvider, PackageMetadata};
pub use source::MetadataSource;
