use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default npm registry.
pub const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Global user configuration loaded from `~/.depsat/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub solver: SolverConfig,
}

/// Registry access settings from `[registry]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs", rename = "timeout-secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Follow `devDependencies` of every crawled version, not only the roots'.
    #[serde(default = "default_true", rename = "include-dev-dependencies")]
    pub include_dev_dependencies: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            include_dev_dependencies: true,
        }
    }
}

fn default_registry_url() -> String {
    NPM_REGISTRY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

/// Solver settings from `[solver]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Add at-most-one clauses over all versions of each package.
    #[serde(default, rename = "unique-versions")]
    pub unique_versions: bool,
    /// Treat several selected versions of one package as an error.
    #[serde(default)]
    pub strict: bool,
    /// Wall-clock bound for the SAT search; `0` means unbounded.
    #[serde(default, rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl GlobalConfig {
    /// Load `~/.depsat/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        let path = Self::default_path();
        if path.is_file() {
            Self::from_path(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load a config file that must exist.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            depsat_util::errors::DepsatError::Config {
                message: format!("Failed to read {}: {e}", path.display()),
            }
        })?;
        Self::from_str(&content)
    }

    /// Parse a config from TOML text.
    pub fn from_str(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            depsat_util::errors::DepsatError::Config {
                message: format!("Failed to parse config: {e}"),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the path to the depsat data directory (`~/.depsat/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".depsat")
}
