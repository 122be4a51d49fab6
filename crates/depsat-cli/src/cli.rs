//! CLI argument definitions for depsat.
//!
//! Uses `clap` derive macros. Each command corresponds to a handler in the
//! [`super::commands`] module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "depsat",
    version,
    about = "Resolve npm dependency sets with a SAT solver",
    long_about = "depsat crawls an npm registry from a set of root requirements, encodes the \
                  resulting requirement graph as a boolean formula and asks a SAT solver for \
                  one version per package."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ~/.depsat/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Registry base URL, overriding the config file
    #[arg(long, global = true, value_name = "URL", env = "DEPSAT_REGISTRY")]
    pub registry: Option<String>,
}

/// Where the root requirements and package metadata come from.
#[derive(Args, Debug, Clone, Default)]
pub struct RootArgs {
    /// Root requirements as `name@range` (a bare name means any version)
    pub specs: Vec<String>,

    /// Read root requirements from a package.json
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Also take the manifest's devDependencies as roots
    #[arg(long)]
    pub dev: bool,

    /// Serve metadata from a JSON snapshot instead of the registry
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl the registry and solve for one version per package
    Resolve {
        #[command(flatten)]
        roots: RootArgs,
        /// Allow at most one version of each package
        #[arg(long)]
        unique_versions: bool,
        /// Fail when several versions of a package are selected
        #[arg(long)]
        strict: bool,
        /// Print the selection as JSON
        #[arg(long)]
        json: bool,
    },

    /// Crawl the registry and report the requirement graph without solving
    Crawl {
        #[command(flatten)]
        roots: RootArgs,
        /// Print the requirement tree
        #[arg(long)]
        tree: bool,
        /// Maximum tree depth
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Explain why a package is part of the requirement graph
    Why {
        /// Package name or `name:spec` key
        package: String,
        #[command(flatten)]
        roots: RootArgs,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
