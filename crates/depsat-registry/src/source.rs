//! The transport boundary: anything that can hand out packuments by name.

use async_trait::async_trait;

use crate::error::RegistryError;
use crate::packument::Packument;

/// A backend that serves packuments.
///
/// Implementations do no caching of their own; [`crate::MetadataProvider`]
/// memoizes on top of them.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the packument for `name`.
    ///
    /// Returns [`RegistryError::NotFound`] when the backend has no such
    /// package.
    async fn fetch_packument(&self, name: &str) -> Result<Packument, RegistryError>;

    /// Human-readable backend name for logs.
    fn name(&self) -> &str;
}
