use depsat_registry::snapshot::SnapshotRegistry;
use depsat_registry::{MetadataProvider, RegistryError};
use semver::Version;

const SNAPSHOT: &str = r#"{
  "a": {
    "versions": {
      "1.0.0": {"dependencies": {"b": "1.0.0"}, "devDependencies": {"c": "*"}},
      "1.1.0": {"dependencies": {"b": "^1.0.0"}}
    }
  },
  "b": {"versions": {"1.0.0": {}}}
}"#;

#[tokio::test]
async fn test_snapshot_file_through_provider() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("registry.json");
    std::fs::write(&path, SNAPSHOT).unwrap();

    let provider = MetadataProvider::new(SnapshotRegistry::from_path(&path).unwrap());
    let a = provider.fetch("a").await.unwrap();
    let versions: Vec<String> = a.versions().map(|v| v.to_string()).collect();
    assert_eq!(versions, vec!["1.0.0", "1.1.0"]);

    let deps = provider
        .dependencies_of("a", &Version::new(1, 0, 0))
        .await
        .unwrap();
    let keys: Vec<String> = deps.iter().map(|d| d.key()).collect();
    assert_eq!(keys, vec!["b:1.0.0", "c:*"]);
}

#[tokio::test]
async fn test_provider_without_dev_dependencies() {
    let provider = MetadataProvider::new(SnapshotRegistry::from_str(SNAPSHOT).unwrap())
        .with_dev_dependencies(false);
    let deps = provider
        .dependencies_of("a", &Version::new(1, 0, 0))
        .await
        .unwrap();
    assert_eq!(deps.len(), 1);
}

#[tokio::test]
async fn test_missing_package_reports_not_found() {
    let provider = MetadataProvider::new(SnapshotRegistry::from_str(SNAPSHOT).unwrap());
    let err = provider.fetch("zzz").await.unwrap_err();
    assert_eq!(err, RegistryError::not_found("zzz"));
    assert_eq!(err.to_string(), "package `zzz` not found in registry");
}

#[test]
fn test_missing_snapshot_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    let err = SnapshotRegistry::from_path(&tmp.path().join("none.json")).unwrap_err();
    assert!(err.to_string().contains("Registry error"), "got: {err}");
}
