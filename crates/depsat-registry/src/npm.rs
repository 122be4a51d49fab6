//! HTTP source for npm-compatible registries.

use std::time::Duration;

use async_trait::async_trait;
use depsat_core::config::RegistryConfig;
use reqwest::{header, Client, StatusCode};
use tracing::debug;

use crate::error::RegistryError;
use crate::packument::{self, Packument};
use crate::source::MetadataSource;

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Full metadata, needed for `devDependencies`.
const ACCEPT_FULL: &str = "application/json";

/// Abbreviated "corgi" metadata: smaller, but without `devDependencies`.
const ACCEPT_ABBREVIATED: &str =
    "application/vnd.npm.install-v1+json; q=1.0, application/json; q=0.8, */*";

/// Packument fetcher for `registry.npmjs.org` and mirrors.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    client: Client,
    base_url: String,
    retries: u32,
    abbreviated: bool,
}

impl NpmRegistry {
    /// Build a registry client from `[registry]` settings.
    pub fn new(config: &RegistryConfig) -> miette::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("depsat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| depsat_util::errors::DepsatError::Registry {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            retries: config.retries.max(1),
            abbreviated: !config.include_dev_dependencies,
        })
    }

    /// URL of a package's packument. Scoped names keep their `@` but the
    /// separating slash is escaped: `@types/node` becomes `@types%2fnode`.
    pub fn packument_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name.replace('/', "%2f"))
    }

    async fn fetch_text(&self, name: &str) -> Result<String, RegistryError> {
        let url = self.packument_url(name);
        let accept = if self.abbreviated {
            ACCEPT_ABBREVIATED
        } else {
            ACCEPT_FULL
        };
        let mut last_err = String::new();

        for attempt in 0..self.retries {
            if attempt > 0 {
                tokio::time::sleep(RETRY_DELAY * attempt).await;
            }
            debug!("GET {url} (attempt {})", attempt + 1);

            match self.client.get(&url).header(header::ACCEPT, accept).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status == StatusCode::NOT_FOUND {
                        return Err(RegistryError::not_found(name));
                    }
                    if status.is_server_error() {
                        last_err = format!("HTTP {status} from {url}");
                        continue;
                    }
                    if !status.is_success() {
                        return Err(RegistryError::Network {
                            name: name.to_string(),
                            message: format!("HTTP {status} fetching {url}"),
                        });
                    }
                    return resp.text().await.map_err(|e| RegistryError::Network {
                        name: name.to_string(),
                        message: format!("Failed to read response from {url}: {e}"),
                    });
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_err = e.to_string();
                    continue;
                }
                Err(e) => {
                    return Err(RegistryError::Network {
                        name: name.to_string(),
                        message: format!("Request to {url} failed: {e}"),
                    });
                }
            }
        }

        Err(RegistryError::Network {
            name: name.to_string(),
            message: format!("Failed after {} attempts for {url}: {last_err}", self.retries),
        })
    }
}

#[async_trait]
impl MetadataSource for NpmRegistry {
    async fn fetch_packument(&self, name: &str) -> Result<Packument, RegistryError> {
        let body = self.fetch_text(name).await?;
        packument::parse_packument(&body).map_err(|e| RegistryError::Parse {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}
