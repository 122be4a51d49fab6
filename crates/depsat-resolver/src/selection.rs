//! The decoded solution: one version per package.

use std::collections::BTreeMap;
use std::fmt;

use semver::Version;
use serde::Serialize;

/// A package's chosen version and the specifiers that asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedPackage {
    pub name: String,
    pub version: Version,
    /// Canonical keys of the true specifiers of this package, sorted.
    pub patterns: Vec<String>,
}

/// More than one version of a package came out true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ambiguity {
    pub name: String,
    /// Ascending.
    pub candidates: Vec<Version>,
    pub chosen: Version,
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let candidates: Vec<String> = self.candidates.iter().map(Version::to_string).collect();
        write!(
            f,
            "{}: {} selected, kept {}",
            self.name,
            candidates.join(", "),
            self.chosen
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub packages: BTreeMap<String, SelectedPackage>,
    pub ambiguities: Vec<Ambiguity>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: SelectedPackage) {
        self.packages.insert(package.name.clone(), package);
    }

    /// Chosen version of `name`.
    pub fn get(&self, name: &str) -> Option<&Version> {
        self.packages.get(name).map(|p| &p.version)
    }

    /// Packages sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &SelectedPackage> {
        self.packages.values()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.packages.is_empty() {
            return write!(f, "No packages selected.");
        }
        for pkg in self.packages.values() {
            writeln!(f, "{}@{} ({})", pkg.name, pkg.version, pkg.patterns.join(", "))?;
        }
        if !self.ambiguities.is_empty() {
            writeln!(f, "Ambiguous selections ({}):", self.ambiguities.len())?;
            for a in &self.ambiguities {
                writeln!(f, "  {a}")?;
            }
        }
        Ok(())
    }
}
