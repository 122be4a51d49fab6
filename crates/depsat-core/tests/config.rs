use depsat_core::config::{dirs_path, GlobalConfig, NPM_REGISTRY_URL};

#[test]
fn test_global_config_default_registry() {
    let config = GlobalConfig::default();
    assert_eq!(config.registry.url, NPM_REGISTRY_URL);
    assert_eq!(config.registry.retries, 3);
    assert!(config.registry.include_dev_dependencies);
}

#[test]
fn test_global_config_default_solver_is_permissive() {
    let config = GlobalConfig::default();
    assert!(!config.solver.unique_versions);
    assert!(!config.solver.strict);
    assert_eq!(config.solver.timeout_secs, 0);
}

#[test]
fn test_global_config_empty_toml_uses_defaults() {
    let config = GlobalConfig::from_str("").unwrap();
    assert_eq!(config.registry.timeout_secs, 30);
    assert!(config.registry.include_dev_dependencies);
}

#[test]
fn test_dirs_path_contains_depsat() {
    let path = dirs_path();
    assert!(path.ends_with(".depsat"));
}

#[test]
fn test_global_config_parse_from_toml() {
    let toml = r#"
[registry]
url = "https://npm.example.com"
timeout-secs = 5
retries = 1
include-dev-dependencies = false

[solver]
unique-versions = true
strict = true
timeout-secs = 60
"#;
    let config = GlobalConfig::from_str(toml).unwrap();
    assert_eq!(config.registry.url, "https://npm.example.com");
    assert_eq!(config.registry.timeout_secs, 5);
    assert_eq!(config.registry.retries, 1);
    assert!(!config.registry.include_dev_dependencies);
    assert!(config.solver.unique_versions);
    assert!(config.solver.strict);
    assert_eq!(config.solver.timeout_secs, 60);
}

#[test]
fn test_global_config_rejects_bad_types() {
    let err = GlobalConfig::from_str("[registry]\nretries = \"many\"\n").unwrap_err();
    assert!(err.to_string().contains("Configuration error"), "got: {err}");
}

#[test]
fn test_global_config_from_path() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[solver]\nstrict = true\n").unwrap();
    let config = GlobalConfig::from_path(&path).unwrap();
    assert!(config.solver.strict);
    assert_eq!(config.registry.url, NPM_REGISTRY_URL);
}

#[test]
fn test_global_config_missing_file_is_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    assert!(GlobalConfig::from_path(&tmp.path().join("nope.toml")).is_err());
}
