//! The registry crawl.
//!
//! Starting from the root specifiers, every specifier is flattened to the
//! concrete versions it matches, and every matching version is expanded to
//! its own dependency specifiers, until nothing new turns up. Packages the
//! registry cannot answer for are recorded as missing instead of aborting.

use std::collections::BTreeMap;
use std::sync::Arc;

use depsat_core::Specifier;
use depsat_registry::{MetadataProvider, RegistryError};
use semver::Version;
use tracing::{info, warn};

use crate::graph::{Flattening, ResolvedGraph, VersionDependencies};
use crate::worklist::Worklist;

/// Progress callbacks from [`Resolver::resolve`].
pub trait ResolveObserver: Send {
    /// Called before each specifier is processed. `total` counts processed
    /// plus still-queued specifiers, so it grows as the crawl discovers more.
    fn processing(&mut self, key: &str, processed: usize, total: usize);

    fn missing(&mut self, _key: &str, _error: &RegistryError) {}
}

/// Per-package table of already-expanded versions.
type Expansions = BTreeMap<String, BTreeMap<Version, Vec<Specifier>>>;

pub struct Resolver {
    provider: Arc<MetadataProvider>,
    observer: Option<Box<dyn ResolveObserver>>,
}

impl Resolver {
    pub fn new(provider: Arc<MetadataProvider>) -> Self {
        Self {
            provider,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: impl ResolveObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn provider(&self) -> &Arc<MetadataProvider> {
        &self.provider
    }

    /// Crawl the registry from `roots` and return the requirement graph.
    pub async fn resolve(&mut self, roots: &[Specifier]) -> ResolvedGraph {
        let mut worklist = Worklist::new();
        for root in roots {
            self.enqueue(&mut worklist, root.clone());
        }

        let mut expansions = Expansions::new();
        let mut flattened = Vec::new();
        let mut missing = Vec::new();
        let mut processed = 0usize;

        while let Some(specifier) = worklist.pop() {
            processed += 1;
            let key = specifier.key();
            let total = processed + worklist.len();
            info!("Processing {key} ({processed}/{total})");
            if let Some(observer) = self.observer.as_mut() {
                observer.processing(&key, processed, total);
            }

            if let Err(err) = self
                .process(&specifier, &mut worklist, &mut expansions, &mut flattened)
                .await
            {
                warn!("Could not resolve {key}: {err}. Ignoring it.");
                if let Some(observer) = self.observer.as_mut() {
                    observer.missing(&key, &err);
                }
                missing.push(specifier);
            }
        }

        let edges = expansions
            .into_iter()
            .flat_map(|(name, versions)| {
                versions
                    .into_iter()
                    .map(move |(version, dependencies)| VersionDependencies {
                        name: name.clone(),
                        version,
                        dependencies,
                    })
            })
            .collect();

        ResolvedGraph {
            roots: roots.to_vec(),
            flattened,
            edges,
            missing,
        }
    }

    /// Flatten one specifier and expand its not-yet-seen versions.
    ///
    /// The flattening is recorded before expansion, so a dependency lookup
    /// failing halfway leaves the specifier both flattened and missing.
    async fn process(
        &self,
        specifier: &Specifier,
        worklist: &mut Worklist,
        expansions: &mut Expansions,
        flattened: &mut Vec<Flattening>,
    ) -> Result<(), RegistryError> {
        let name = specifier.name();
        let metadata = self.provider.fetch(name).await?;
        let versions = metadata.matching(specifier);
        flattened.push(Flattening {
            specifier: specifier.clone(),
            versions: versions.clone(),
        });

        let expanded = expansions.entry(name.to_string()).or_default();
        for version in versions {
            if expanded.contains_key(&version) {
                continue;
            }
            let dependencies = self.provider.dependencies_of(name, &version).await?;
            for dep in &dependencies {
                self.enqueue(worklist, dep.clone());
            }
            expanded.insert(version, dependencies);
        }
        Ok(())
    }

    fn enqueue(&self, worklist: &mut Worklist, specifier: Specifier) {
        let name = specifier.name().to_string();
        if worklist.push(specifier) {
            self.provider.prefetch(&name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depsat_registry::snapshot::SnapshotRegistry;
    use std::sync::Mutex;

    fn resolver(snap: SnapshotRegistry) -> Resolver {
        Resolver::new(Arc::new(MetadataProvider::new(snap)))
    }

    fn keys(flattened: &[Flattening]) -> Vec<String> {
        flattened.iter().map(|f| f.specifier.key()).collect()
    }

    #[tokio::test]
    async fn crawls_transitively() {
        let snap = SnapshotRegistry::new()
            .with_version("a", "1.0.0", &[("b", "^2.0.0")])
            .with_version("b", "2.0.0", &[("c", "1.x")])
            .with_version("b", "2.1.0", &[("c", "1.x")])
            .with_version("c", "1.4.0", &[]);
        let graph = resolver(snap)
            .resolve(&[Specifier::parse("a", "^1.0.0")])
            .await;

        assert_eq!(keys(&graph.flattened), vec!["a:^1.0.0", "b:^2.0.0", "c:1.x"]);
        assert_eq!(
            graph.flattened[1].versions,
            vec![Version::new(2, 0, 0), Version::new(2, 1, 0)]
        );
        let expanded: Vec<String> = graph.edges.iter().map(VersionDependencies::key).collect();
        assert_eq!(expanded, vec!["a:1.0.0", "b:2.0.0", "b:2.1.0", "c:1.4.0"]);
        assert!(graph.missing.is_empty());
    }

    #[tokio::test]
    async fn duplicate_roots_processed_once() {
        let snap = SnapshotRegistry::new().with_version("a", "1.0.0", &[]);
        let roots = [Specifier::parse("a", "1"), Specifier::parse("a", "1")];
        let graph = resolver(snap).resolve(&roots).await;
        assert_eq!(graph.flattened.len(), 1);
        assert_eq!(graph.roots.len(), 2);
    }

    #[tokio::test]
    async fn unknown_package_goes_missing() {
        let snap = SnapshotRegistry::new().with_version("a", "1.0.0", &[("ghost", "*")]);
        let graph = resolver(snap)
            .resolve(&[Specifier::parse("a", "*")])
            .await;
        assert_eq!(graph.missing, vec![Specifier::parse("ghost", "*")]);
        assert_eq!(graph.flattened.len(), 1);
    }

    #[tokio::test]
    async fn no_match_is_flattened_empty_not_missing() {
        let snap = SnapshotRegistry::new().with_version("a", "1.0.0", &[]);
        let graph = resolver(snap)
            .resolve(&[Specifier::parse("a", "^3.0.0")])
            .await;
        assert!(graph.missing.is_empty());
        assert!(graph.flattened[0].versions.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[tokio::test]
    async fn cycles_terminate() {
        let snap = SnapshotRegistry::new()
            .with_version("a", "1.0.0", &[("b", "1.0.0")])
            .with_version("b", "1.0.0", &[("a", "1.0.0")]);
        let graph = resolver(snap)
            .resolve(&[Specifier::parse("a", "1.0.0")])
            .await;
        assert_eq!(keys(&graph.flattened), vec!["a:1.0.0", "b:1.0.0"]);
        assert_eq!(graph.edges.len(), 2);
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(String, usize, usize)>>>);

    impl ResolveObserver for Recorder {
        fn processing(&mut self, key: &str, processed: usize, total: usize) {
            self.0.lock().unwrap().push((key.to_string(), processed, total));
        }

        fn missing(&mut self, key: &str, _error: &RegistryError) {
            self.0.lock().unwrap().push((format!("missing {key}"), 0, 0));
        }
    }

    #[tokio::test]
    async fn observer_sees_progress() {
        let snap = SnapshotRegistry::new().with_version("a", "1.0.0", &[("b", "*")]);
        let recorder = Recorder::default();
        let mut resolver = resolver(snap).with_observer(recorder.clone());
        resolver.resolve(&[Specifier::parse("a", "*")]).await;

        let events = recorder.0.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                ("a:*".to_string(), 1, 1),
                ("b:*".to_string(), 2, 2),
                ("missing b:*".to_string(), 0, 0),
            ]
        );
    }
}
