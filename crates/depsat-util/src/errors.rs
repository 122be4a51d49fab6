use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all depsat operations.
#[derive(Debug, Error, Diagnostic)]
pub enum DepsatError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable configuration file.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check ~/.depsat/config.toml or the file passed with --config"))]
    Config { message: String },

    /// Invalid or malformed root manifest (package.json).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your package.json for syntax errors"))]
    Manifest { message: String },

    /// Registry metadata could not be loaded (snapshot files, client setup).
    #[error("Registry error: {message}")]
    Registry { message: String },

    /// Dependency resolution or solving failed.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type DepsatResult<T> = miette::Result<T>;
