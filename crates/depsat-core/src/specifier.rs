use std::fmt;

use semver::Version;

use crate::range::{self, VersionRange};

/// A package requirement: a name plus an exact version, an npm range, or an
/// opaque tag (dist-tag, git ref, URL, alias).
///
/// Every specifier has a canonical key `name:spec`. The resolver uses it to
/// deduplicate its worklist and the solver uses it as a variable name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Specifier {
    Exact { name: String, version: Version },
    Range { name: String, range: VersionRange },
    Opaque { name: String, tag: String },
}

impl Specifier {
    /// Classify a requirement string.
    ///
    /// Ranges win over versions: a bare `1.0.0` is a valid range matching
    /// exactly that version. Anything that is neither becomes [`Specifier::Opaque`].
    pub fn parse(name: &str, spec: &str) -> Self {
        if let Ok(range) = VersionRange::parse(spec) {
            return Self::Range {
                name: name.to_string(),
                range,
            };
        }
        if let Ok(version) = Version::parse(spec.trim().trim_start_matches('v')) {
            return Self::exact(name, version);
        }
        Self::Opaque {
            name: name.to_string(),
            tag: spec.to_string(),
        }
    }

    /// A specifier for one concrete version.
    pub fn exact(name: &str, version: Version) -> Self {
        Self::Exact {
            name: name.to_string(),
            version,
        }
    }

    /// Parse a command-line style requirement: `name@spec`, `@scope/name@spec`,
    /// or a bare name meaning `*`.
    pub fn parse_request(request: &str) -> Self {
        let search_from = usize::from(request.starts_with('@'));
        match request[search_from..].find('@') {
            Some(idx) => {
                let (name, spec) = request.split_at(search_from + idx);
                Self::parse(name, &spec[1..])
            }
            None => Self::parse(request, "*"),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Exact { name, .. } | Self::Range { name, .. } | Self::Opaque { name, .. } => {
                name
            }
        }
    }

    /// The requirement part of the canonical key.
    pub fn spec(&self) -> String {
        match self {
            Self::Exact { version, .. } => version.to_string(),
            Self::Range { range, .. } => range.raw().to_string(),
            Self::Opaque { tag, .. } => tag.clone(),
        }
    }

    /// Canonical `name:spec` key.
    pub fn key(&self) -> String {
        format!("{}:{}", self.name(), self.spec())
    }

    /// Whether a concrete version satisfies this requirement.
    pub fn contains(&self, candidate: &Version) -> bool {
        match self {
            Self::Exact { version, .. } => {
                range::precedence(version, candidate) == std::cmp::Ordering::Equal
            }
            Self::Range { range, .. } => range.contains(candidate),
            Self::Opaque { tag, .. } => *tag == candidate.to_string(),
        }
    }

    /// Exact and opaque specifiers each denote a single fix version.
    pub fn is_fix(&self) -> bool {
        !matches!(self, Self::Range { .. })
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name(), self.spec())
    }
}

/// Split a canonical key into `(name, spec)`.
///
/// Package names never contain `:`, so the first colon is the separator even
/// when the spec itself contains colons (`git+ssh://...`).
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(':')
}
