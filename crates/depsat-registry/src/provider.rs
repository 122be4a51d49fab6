//! Memoizing metadata provider.
//!
//! Every package name gets exactly one lookup per run. The first caller
//! installs an empty cell in the memo table (a single atomic entry-or-insert);
//! that caller and everyone arriving while the lookup is in flight await the
//! same cell. Failures are memoized as well, and nothing is ever evicted.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use depsat_core::Specifier;
use semver::Version;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::RegistryError;
use crate::packument::Packument;
use crate::source::MetadataSource;

/// What the resolver needs to know about one package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageMetadata {
    pub name: String,
    /// Dependency specifiers of every published version, ordered by version.
    pub dependencies_by_version: BTreeMap<Version, Vec<Specifier>>,
}

impl PackageMetadata {
    /// Convert a packument, skipping version keys that are not valid semver.
    pub fn from_packument(packument: &Packument, include_dev: bool) -> Self {
        let mut dependencies_by_version = BTreeMap::new();
        for (raw, manifest) in &packument.versions {
            let Ok(version) = Version::parse(raw) else {
                debug!("{}: skipping unparseable version `{raw}`", packument.name);
                continue;
            };
            let mut deps: Vec<Specifier> = manifest
                .dependencies
                .iter()
                .map(|(name, spec)| Specifier::parse(name, spec))
                .collect();
            if include_dev {
                deps.extend(
                    manifest
                        .dev_dependencies
                        .iter()
                        .map(|(name, spec)| Specifier::parse(name, spec)),
                );
            }
            dependencies_by_version.insert(version, deps);
        }
        Self {
            name: packument.name.clone(),
            dependencies_by_version,
        }
    }

    /// All known concrete versions, ascending.
    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.dependencies_by_version.keys()
    }

    /// Versions accepted by `specifier`, ascending.
    pub fn matching(&self, specifier: &Specifier) -> Vec<Version> {
        self.versions()
            .filter(|v| specifier.contains(v))
            .cloned()
            .collect()
    }
}

type MetadataResult = Result<Arc<PackageMetadata>, RegistryError>;

/// Run-scoped memo over a [`MetadataSource`].
pub struct MetadataProvider {
    source: Box<dyn MetadataSource>,
    include_dev: bool,
    cache: DashMap<String, Arc<OnceCell<MetadataResult>>>,
}

impl MetadataProvider {
    pub fn new(source: impl MetadataSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            include_dev: true,
            cache: DashMap::new(),
        }
    }

    /// Whether `devDependencies` count as dependencies of a version.
    pub fn with_dev_dependencies(mut self, include_dev: bool) -> Self {
        self.include_dev = include_dev;
        self
    }

    /// Metadata for `name`, fetched at most once per provider.
    pub async fn fetch(&self, name: &str) -> MetadataResult {
        let cell = self.cache.entry(name.to_string()).or_default().clone();
        cell.get_or_init(|| self.load(name)).await.clone()
    }

    async fn load(&self, name: &str) -> MetadataResult {
        debug!("Fetching metadata for {name} from {}", self.source.name());
        let packument = self
            .source
            .fetch_packument(name)
            .await
            .inspect_err(|e| debug!("{e}"))?;
        Ok(Arc::new(PackageMetadata::from_packument(
            &packument,
            self.include_dev,
        )))
    }

    /// Dependency specifiers of one concrete version.
    pub async fn dependencies_of(
        &self,
        name: &str,
        version: &Version,
    ) -> Result<Vec<Specifier>, RegistryError> {
        let metadata = self.fetch(name).await?;
        metadata
            .dependencies_by_version
            .get(version)
            .cloned()
            .ok_or_else(|| RegistryError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            })
    }

    /// Start fetching `name` in the background; the result lands in the memo
    /// table and errors are dropped.
    pub fn prefetch(self: &Arc<Self>, name: &str) {
        if self.cache.contains_key(name) {
            return;
        }
        let provider = Arc::clone(self);
        let name = name.to_string();
        tokio::spawn(async move {
            let _ = provider.fetch(&name).await;
        });
    }

    /// Number of package names looked up so far (pending or done).
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
