use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::specifier::Specifier;

/// The parts of a `package.json` that supply root requirements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
}

impl PackageJson {
    /// Read and parse a `package.json` from disk.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            depsat_util::errors::DepsatError::Manifest {
                message: format!("Failed to read {}: {e}", path.display()),
            }
        })?;
        Self::from_str(&content)
    }

    /// Parse a `package.json` from a string.
    pub fn from_str(content: &str) -> miette::Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            depsat_util::errors::DepsatError::Manifest {
                message: format!("Failed to parse package.json: {e}"),
            }
            .into()
        })
    }

    /// Root specifiers sorted by name within each table, dependencies first.
    pub fn root_specifiers(&self, include_dev: bool) -> Vec<Specifier> {
        let mut roots: Vec<Specifier> = self
            .dependencies
            .iter()
            .map(|(name, spec)| Specifier::parse(name, spec))
            .collect();
        if include_dev {
            roots.extend(
                self.dev_dependencies
                    .iter()
                    .map(|(name, spec)| Specifier::parse(name, spec)),
            );
        }
        roots
    }
}
