//! In-memory registry loaded from a JSON snapshot.
//!
//! A snapshot file is a JSON object mapping package names to packuments:
//!
//! ```json
//! {
//!   "a": { "versions": { "1.0.0": { "dependencies": { "b": "1.0.0" } } } },
//!   "b": { "versions": { "1.0.0": {} } }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::error::RegistryError;
use crate::packument::{Packument, VersionManifest};
use crate::source::MetadataSource;

/// Offline registry backed by a fixed set of packuments.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRegistry {
    packages: HashMap<String, Packument>,
}

impl SnapshotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot file.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            depsat_util::errors::DepsatError::Registry {
                message: format!("Failed to read snapshot {}: {e}", path.display()),
            }
        })?;
        Self::from_str(&content)
    }

    /// Parse snapshot JSON.
    pub fn from_str(content: &str) -> miette::Result<Self> {
        let mut packages: HashMap<String, Packument> = serde_json::from_str(content)
            .map_err(|e| depsat_util::errors::DepsatError::Registry {
                message: format!("Failed to parse snapshot: {e}"),
            })?;
        for (name, packument) in packages.iter_mut() {
            if packument.name.is_empty() {
                packument.name = name.clone();
            }
        }
        Ok(Self { packages })
    }

    /// Publish one version with its runtime dependencies.
    pub fn add_version(&mut self, name: &str, version: &str, dependencies: &[(&str, &str)]) {
        let packument = self
            .packages
            .entry(name.to_string())
            .or_insert_with(|| Packument {
                name: name.to_string(),
                ..Packument::default()
            });
        packument.versions.insert(
            version.to_string(),
            VersionManifest {
                dependencies: dependencies
                    .iter()
                    .map(|(dep, spec)| (dep.to_string(), spec.to_string()))
                    .collect(),
                ..VersionManifest::default()
            },
        );
    }

    /// Builder-style [`SnapshotRegistry::add_version`].
    pub fn with_version(mut self, name: &str, version: &str, dependencies: &[(&str, &str)]) -> Self {
        self.add_version(name, version, dependencies);
        self
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[async_trait]
impl MetadataSource for SnapshotRegistry {
    async fn fetch_packument(&self, name: &str) -> Result<Packument, RegistryError> {
        self.packages
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(name))
    }

    fn name(&self) -> &str {
        "snapshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_fills_missing_names() {
        let snap = SnapshotRegistry::from_str(
            r#"{"a": {"versions": {"1.0.0": {"dependencies": {"b": "1.0.0"}}}}}"#,
        )
        .unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.packages["a"].name, "a");
    }

    #[test]
    fn add_version_accumulates() {
        let snap = SnapshotRegistry::new()
            .with_version("a", "1.0.0", &[])
            .with_version("a", "1.1.0", &[("b", "^1")]);
        let a = &snap.packages["a"];
        assert_eq!(a.versions.len(), 2);
        assert_eq!(a.versions["1.1.0"].dependencies["b"], "^1");
    }

    #[tokio::test]
    async fn unknown_package_is_not_found() {
        let snap = SnapshotRegistry::new();
        let err = snap.fetch_packument("ghost").await.unwrap_err();
        assert_eq!(err, RegistryError::not_found("ghost"));
    }

    #[test]
    fn invalid_snapshot_is_error() {
        assert!(SnapshotRegistry::from_str("[1, 2, 3]").is_err());
    }
}
