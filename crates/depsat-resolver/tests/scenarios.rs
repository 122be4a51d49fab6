use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use depsat_core::Specifier;
use depsat_registry::packument::Packument;
use depsat_registry::snapshot::SnapshotRegistry;
use depsat_registry::{MetadataProvider, MetadataSource, RegistryError};
use depsat_resolver::{ResolvedGraph, Resolver, Solution, Solver, SolverOptions};
use semver::Version;

async fn crawl(snap: SnapshotRegistry, roots: &[(&str, &str)]) -> ResolvedGraph {
    let roots: Vec<Specifier> = roots.iter().map(|(n, s)| Specifier::parse(n, s)).collect();
    Resolver::new(Arc::new(MetadataProvider::new(snap)))
        .resolve(&roots)
        .await
}

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

#[tokio::test]
async fn scenario_a_simple_chain() {
    let snap = SnapshotRegistry::new()
        .with_version("a", "1.0.0", &[("b", "1.0.0")])
        .with_version("b", "1.0.0", &[]);
    let graph = crawl(snap, &[("a", "^1.0.0")]).await;

    let solution = Solver::default().solve(&graph).unwrap();
    let selection = solution.selection().expect("satisfiable");
    assert_eq!(selection.len(), 2);
    assert_eq!(selection.get("a"), Some(&v("1.0.0")));
    assert_eq!(selection.get("b"), Some(&v("1.0.0")));
    assert_eq!(selection.packages["a"].patterns, vec!["a:^1.0.0"]);
    assert!(selection.ambiguities.is_empty());
}

#[tokio::test]
async fn scenario_b_missing_root_is_unsatisfiable() {
    let graph = crawl(SnapshotRegistry::new(), &[("a", "^1.0.0")]).await;

    assert_eq!(graph.missing, vec![Specifier::parse("a", "^1.0.0")]);
    let solution = Solver::default().solve(&graph).unwrap();
    assert!(matches!(solution, Solution::Unsatisfiable));
}

#[tokio::test]
async fn scenario_c_two_exact_roots() {
    let snap = SnapshotRegistry::new()
        .with_version("a", "1.0.0", &[])
        .with_version("a", "2.0.0", &[]);
    let graph = crawl(snap, &[("a", "1.0.0"), ("a", "2.0.0")]).await;

    let model = Solver::default().assignment(&graph).unwrap().expect("satisfiable");
    assert!(model.is_true("a:1.0.0"));
    assert!(model.is_true("a:2.0.0"));

    let solution = Solver::default().solve(&graph).unwrap();
    let selection = solution.selection().unwrap();
    assert_eq!(selection.get("a"), Some(&v("2.0.0")));
    assert_eq!(selection.ambiguities.len(), 1);
    assert_eq!(selection.ambiguities[0].candidates, vec![v("1.0.0"), v("2.0.0")]);

    let unique = Solver::new(SolverOptions {
        unique_versions: true,
        ..SolverOptions::default()
    });
    assert!(!unique.solve(&graph).unwrap().is_satisfied());
}

#[tokio::test]
async fn range_flattening() {
    let snap = SnapshotRegistry::new()
        .with_version("pkg", "1.0.0", &[])
        .with_version("pkg", "1.2.0", &[])
        .with_version("pkg", "2.0.0", &[]);
    let graph = crawl(snap, &[("pkg", "^1.0.0")]).await;

    assert_eq!(graph.flattened.len(), 1);
    assert_eq!(graph.flattened[0].versions, vec![v("1.0.0"), v("1.2.0")]);
}

#[tokio::test]
async fn transitively_missing_requirement_is_unsatisfiable() {
    let snap = SnapshotRegistry::new()
        .with_version("app", "1.0.0", &[("lib", "^1.0.0")])
        .with_version("lib", "1.0.0", &[("gone", "~0.1.0")]);
    let graph = crawl(snap, &[("app", "1.0.0")]).await;

    assert_eq!(graph.missing_keys(), BTreeSet::from(["gone:~0.1.0".to_string()]));
    assert!(!Solver::default().solve(&graph).unwrap().is_satisfied());
}

#[tokio::test]
async fn dist_tag_dependency_matches_nothing() {
    let snap = SnapshotRegistry::new()
        .with_version("a", "1.0.0", &[("b", "latest")])
        .with_version("a", "1.1.0", &[("b", "^1.0.0")])
        .with_version("b", "1.0.0", &[]);
    let graph = crawl(snap, &[("a", "*")]).await;

    let tagged = graph
        .flattened
        .iter()
        .find(|f| f.specifier.key() == "b:latest")
        .expect("b:latest is flattened");
    assert!(matches!(tagged.specifier, Specifier::Opaque { .. }));
    assert!(tagged.versions.is_empty());
    assert!(graph.missing.is_empty());

    // a@1.0.0 needs an unmatchable tag, so only a@1.1.0 can be picked
    let solution = Solver::default().solve(&graph).unwrap();
    let selection = solution.selection().unwrap();
    assert_eq!(selection.get("a"), Some(&v("1.1.0")));
    assert_eq!(selection.get("b"), Some(&v("1.0.0")));

    let pinned = crawl(
        SnapshotRegistry::new()
            .with_version("a", "1.0.0", &[("b", "latest")])
            .with_version("b", "1.0.0", &[]),
        &[("a", "1.0.0")],
    )
    .await;
    assert!(!Solver::default().solve(&pinned).unwrap().is_satisfied());
}

#[tokio::test]
async fn resolve_is_idempotent() {
    let snap = SnapshotRegistry::new()
        .with_version("a", "1.0.0", &[("b", "^1"), ("c", "*")])
        .with_version("a", "1.1.0", &[("b", "^1.1")])
        .with_version("b", "1.0.0", &[("c", "2.x")])
        .with_version("b", "1.1.0", &[])
        .with_version("c", "2.0.0", &[("d", "*")]);
    let first = crawl(snap.clone(), &[("a", "^1")]).await;
    let second = crawl(snap, &[("a", "^1")]).await;

    let flat = |g: &ResolvedGraph| -> BTreeSet<(String, Vec<Version>)> {
        g.flattened
            .iter()
            .map(|f| (f.specifier.key(), f.versions.clone()))
            .collect()
    };
    let edges = |g: &ResolvedGraph| -> BTreeSet<String> {
        g.edges.iter().map(|e| e.key()).collect()
    };
    assert_eq!(flat(&first), flat(&second));
    assert_eq!(edges(&first), edges(&second));
    assert_eq!(first.missing_keys(), second.missing_keys());
    assert_eq!(first.missing_keys(), BTreeSet::from(["d:*".to_string()]));
}

#[tokio::test]
async fn every_enqueued_key_is_reachable() {
    let snap = SnapshotRegistry::new()
        .with_version("a", "1.0.0", &[("b", "^1"), ("c", "^1")])
        .with_version("b", "1.0.0", &[("c", "^1")])
        .with_version("c", "1.0.0", &[("a", "1.0.0")]);
    let graph = crawl(snap, &[("a", "*")]).await;

    let reached = graph.requirement_graph().reachable_keys();
    for flat in &graph.flattened {
        assert!(reached.contains(&flat.specifier.key()));
    }
    for entry in &graph.edges {
        assert!(reached.contains(&entry.key()));
    }
}

/// Wraps a snapshot and counts packument lookups per package.
struct CountingSource {
    inner: SnapshotRegistry,
    calls: Arc<Mutex<HashMap<String, usize>>>,
    total: Arc<AtomicUsize>,
}

#[async_trait]
impl MetadataSource for CountingSource {
    async fn fetch_packument(&self, name: &str) -> Result<Packument, RegistryError> {
        *self.calls.lock().unwrap().entry(name.to_string()).or_default() += 1;
        self.total.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_packument(name).await
    }

    fn name(&self) -> &str {
        "counting"
    }
}

#[tokio::test]
async fn no_package_fetched_twice() {
    let snap = SnapshotRegistry::new()
        .with_version("a", "1.0.0", &[("b", "^1"), ("c", "^1")])
        .with_version("a", "1.1.0", &[("b", "^1"), ("c", "^1")])
        .with_version("b", "1.0.0", &[("c", "1.0.0")])
        .with_version("c", "1.0.0", &[("b", "1.x")]);
    let calls = Arc::new(Mutex::new(HashMap::new()));
    let total = Arc::new(AtomicUsize::new(0));
    let source = CountingSource {
        inner: snap,
        calls: Arc::clone(&calls),
        total: Arc::clone(&total),
    };
    let provider = Arc::new(MetadataProvider::new(source));
    let graph = Resolver::new(provider)
        .resolve(&[Specifier::parse("a", "^1")])
        .await;

    // a@1.0.0 and a@1.1.0 both ask for b:^1 and c:^1; each key is flattened once
    let keys: Vec<String> = graph.flattened.iter().map(|f| f.specifier.key()).collect();
    let unique: BTreeSet<&String> = keys.iter().collect();
    assert_eq!(keys.len(), unique.len());
    assert_eq!(graph.edges.len(), 4);

    for (name, count) in calls.lock().unwrap().iter() {
        assert_eq!(*count, 1, "{name} fetched {count} times");
    }
    assert_eq!(total.load(Ordering::SeqCst), 3);

    let solution = Solver::default().solve(&graph).unwrap();
    assert!(solution.is_satisfied());
}
