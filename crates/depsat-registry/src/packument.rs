//! The npm packument: the per-package metadata document served by the registry.
//!
//! Only the parts the resolver needs are modelled. Old packages in the public
//! registry sometimes carry arrays or other junk where a dependency map is
//! expected; those fields are read leniently and non-string entries dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Registry document for one package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Packument {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub versions: BTreeMap<String, VersionManifest>,
}

/// The manifest of one published version, as embedded in the packument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionManifest {
    #[serde(default, deserialize_with = "lenient_map")]
    pub dependencies: BTreeMap<String, String>,

    #[serde(
        default,
        rename = "devDependencies",
        deserialize_with = "lenient_map"
    )]
    pub dev_dependencies: BTreeMap<String, String>,
}

fn lenient_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Object(entries) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(name, spec)| match spec {
            serde_json::Value::String(spec) => Some((name, spec)),
            _ => None,
        })
        .collect())
}

/// Parse a packument from registry JSON.
pub fn parse_packument(json: &str) -> Result<Packument, serde_json::Error> {
    serde_json::from_str(json)
}
