use thiserror::Error;

/// Failure to obtain metadata for a package or one of its versions.
///
/// The resolver treats every variant the same way: the requested specifier
/// is recorded as missing. The distinction only matters for logging.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("package `{name}` not found in registry")]
    NotFound { name: String },

    #[error("package `{name}` has no version {version}")]
    VersionNotFound { name: String, version: String },

    #[error("network error fetching `{name}`: {message}")]
    Network { name: String, message: String },

    #[error("malformed metadata for `{name}`: {message}")]
    Parse { name: String, message: String },
}

impl RegistryError {
    pub fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
        }
    }
}
