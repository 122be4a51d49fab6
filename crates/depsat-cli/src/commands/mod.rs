//! Command dispatch and the plumbing shared by the handlers.

mod crawl;
mod resolve;
mod why;

use std::path::Path;
use std::sync::Arc;

use depsat_core::config::GlobalConfig;
use depsat_core::manifest::PackageJson;
use depsat_core::Specifier;
use depsat_registry::npm::NpmRegistry;
use depsat_registry::snapshot::SnapshotRegistry;
use depsat_registry::{MetadataProvider, RegistryError};
use depsat_resolver::resolver::ResolveObserver;
use depsat_resolver::{ResolvedGraph, Resolver};
use depsat_util::errors::{DepsatError, DepsatResult};
use depsat_util::progress;
use indicatif::ProgressBar;
use miette::Result;
use tracing::debug;

use crate::cli::{Cli, Command, RootArgs};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.registry.as_deref())?;
    match cli.command {
        Command::Resolve {
            roots,
            unique_versions,
            strict,
            json,
        } => resolve::exec(&config, &roots, unique_versions, strict, json).await,
        Command::Crawl { roots, tree, depth } => crawl::exec(&config, &roots, tree, depth).await,
        Command::Why { package, roots } => why::exec(&config, &roots, &package).await,
    }
}

fn load_config(path: Option<&Path>, registry: Option<&str>) -> DepsatResult<GlobalConfig> {
    let mut config = match path {
        Some(path) => GlobalConfig::from_path(path)?,
        None => GlobalConfig::load()?,
    };
    if let Some(url) = registry {
        config.registry.url = url.to_string();
    }
    debug!("Using registry {}", config.registry.url);
    Ok(config)
}

/// Root specifiers from the command line followed by the manifest's.
pub(crate) fn root_specifiers(args: &RootArgs) -> Result<Vec<Specifier>> {
    let mut roots: Vec<Specifier> = args
        .specs
        .iter()
        .map(|s| Specifier::parse_request(s))
        .collect();
    if let Some(path) = &args.manifest {
        let manifest = PackageJson::from_path(path)?;
        roots.extend(manifest.root_specifiers(args.dev));
    }
    if roots.is_empty() {
        return Err(DepsatError::Generic {
            message: "No root requirements given; pass `name@range` arguments or --manifest"
                .to_string(),
        }
        .into());
    }
    Ok(roots)
}

pub(crate) fn metadata_provider(args: &RootArgs, config: &GlobalConfig) -> Result<Arc<MetadataProvider>> {
    let include_dev = config.registry.include_dev_dependencies;
    let provider = match &args.snapshot {
        Some(path) => MetadataProvider::new(SnapshotRegistry::from_path(path)?),
        None => MetadataProvider::new(NpmRegistry::new(&config.registry)?),
    };
    Ok(Arc::new(provider.with_dev_dependencies(include_dev)))
}

/// Drives the spinner from crawl progress.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl ResolveObserver for SpinnerObserver {
    fn processing(&mut self, key: &str, processed: usize, total: usize) {
        self.bar.set_message(format!("[{processed}/{total}] {key}"));
    }

    fn missing(&mut self, key: &str, error: &RegistryError) {
        self.bar
            .suspend(|| progress::status_warn("Missing", &format!("{key} ({error})")));
    }
}

/// Crawl from the roots described by `args`.
pub(crate) async fn crawl_graph(args: &RootArgs, config: &GlobalConfig) -> Result<ResolvedGraph> {
    let roots = root_specifiers(args)?;
    let provider = metadata_provider(args, config)?;

    let bar = progress::spinner("Crawling registry...");
    let mut resolver = Resolver::new(provider).with_observer(SpinnerObserver { bar: bar.clone() });
    let graph = resolver.resolve(&roots).await;
    bar.finish_and_clear();

    progress::status(
        "Crawled",
        &format!(
            "{} specifiers, {} versions of {} packages",
            graph.flattened.len(),
            graph.edges.len(),
            graph.package_count()
        ),
    );
    Ok(graph)
}
