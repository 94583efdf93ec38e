//! Distribution index: the servers the launcher can start and what each needs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::DistributionError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(default)]
    pub version: String,
    /// Present when the launcher should publish presence at all.
    #[serde(default)]
    pub presence: Option<PresenceSettings>,
    #[serde(default)]
    pub servers: Vec<ServerProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceSettings {
    pub client_id: String,
    #[serde(default)]
    pub small_image_text: Option<String>,
    #[serde(default)]
    pub small_image_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub game_version: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub main_server: bool,
    #[serde(default)]
    pub java: JavaOptions,
    #[serde(default)]
    pub presence: Option<ServerPresence>,
    #[serde(default)]
    pub launch: LaunchTemplate,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// Java requirements for one server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JavaOptions {
    /// Semver requirement on the Java version, e.g. `>=17`.
    #[serde(default = "default_supported")]
    pub supported: String,
    /// Major version to install when nothing compatible is found.
    #[serde(default = "default_suggested_major")]
    pub suggested_major: u32,
    /// Vendor to install from. Only `temurin` is supported.
    #[serde(default)]
    pub distribution: Option<String>,
}

fn default_supported() -> String {
    ">=17".to_string()
}

fn default_suggested_major() -> u32 {
    17
}

impl Default for JavaOptions {
    fn default() -> Self {
        Self {
            supported: default_supported(),
            suggested_major: default_suggested_major(),
            distribution: None,
        }
    }
}

impl JavaOptions {
    pub fn version_req(&self) -> Result<semver::VersionReq, semver::Error> {
        semver::VersionReq::parse(&self.supported)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerPresence {
    pub short_id: String,
    #[serde(default)]
    pub large_image_text: Option<String>,
    #[serde(default)]
    pub large_image_key: Option<String>,
}

/// Command line template for the game process. Paths are relative to the
/// launcher's common dir.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchTemplate {
    #[serde(default)]
    pub main_class: String,
    #[serde(default)]
    pub classpath: Vec<String>,
    #[serde(default)]
    pub jvm_args: Vec<String>,
    #[serde(default)]
    pub game_args: Vec<String>,
}

/// One file the game needs, relative to the common dir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub path: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl Distribution {
    pub fn parse(content: &str) -> Result<Self, DistributionError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn server(&self, id: &str) -> Result<&ServerProfile, DistributionError> {
        self.servers
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| DistributionError::UnknownServer { id: id.to_string() })
    }

    /// The server flagged `main_server`, else the first one.
    pub fn main_server(&self) -> Result<&ServerProfile, DistributionError> {
        self.servers
            .iter()
            .find(|s| s.main_server)
            .or_else(|| self.servers.first())
            .ok_or(DistributionError::NoServers)
    }

    /// `id` if given, else the main server.
    pub fn select_server(&self, id: Option<&str>) -> Result<&ServerProfile, DistributionError> {
        match id {
            Some(id) => self.server(id),
            None => self.main_server(),
        }
    }

    /// Presence is only published when both levels opt in.
    pub fn presence_enabled(&self, server: &ServerProfile) -> bool {
        self.presence.is_some() && server.presence.is_some()
    }
}

/// Where the launch sequence gets its distribution index from.
#[async_trait]
pub trait DistributionSource: Send + Sync {
    async fn load(&self) -> Result<Distribution, DistributionError>;
}

/// A fixed, already loaded index.
#[async_trait]
impl DistributionSource for Distribution {
    async fn load(&self) -> Result<Distribution, DistributionError> {
        Ok(self.clone())
    }
}

/// Loads the distribution index from its source, keeping a local cache copy.
pub struct DistributionApi {
    source: Option<String>,
    cache_path: PathBuf,
    client: Client,
}

impl DistributionApi {
    /// `source` is an http(s) URL or a local file path.
    pub fn new(source: Option<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            cache_path: cache_path.into(),
            client: Client::new(),
        }
    }

    /// Fetch the index, falling back to the cached copy when the source
    /// cannot be read or parsed.
    pub async fn refresh_or_fallback(&self) -> Result<Distribution, DistributionError> {
        let fetch_err = match &self.source {
            Some(source) => match self.fetch(source).await {
                Ok(content) => match Distribution::parse(&content) {
                    Ok(distribution) => {
                        self.write_cache(&content).await;
                        tracing::info!(
                            target: "launch",
                            servers = distribution.servers.len(),
                            "Loaded distribution index"
                        );
                        return Ok(distribution);
                    }
                    Err(e) => Some(e),
                },
                Err(e) => Some(e),
            },
            None => None,
        };

        if let Some(e) = &fetch_err {
            tracing::warn!(target: "launch", error = %e, "Failed to refresh distribution, trying cache");
        }

        match self.read_cache().await {
            Some(distribution) => {
                tracing::info!(target: "launch", "Using cached distribution index");
                Ok(distribution)
            }
            None => Err(fetch_err.unwrap_or(DistributionError::Unavailable)),
        }
    }

    async fn fetch(&self, source: &str) -> Result<String, DistributionError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let fetch_err = |source_err| DistributionError::Fetch {
                url: source.to_string(),
                source: source_err,
            };
            self.client
                .get(source)
                .send()
                .await
                .map_err(fetch_err)?
                .error_for_status()
                .map_err(fetch_err)?
                .text()
                .await
                .map_err(fetch_err)
        } else {
            let path = Path::new(source);
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| DistributionError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
        }
    }

    async fn read_cache(&self) -> Option<Distribution> {
        let content = tokio::fs::read_to_string(&self.cache_path).await.ok()?;
        match Distribution::parse(&content) {
            Ok(distribution) => Some(distribution),
            Err(e) => {
                tracing::warn!(target: "launch", error = %e, "Cached distribution is corrupt");
                None
            }
        }
    }

    async fn write_cache(&self, content: &str) {
        if let Some(parent) = self.cache_path.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            tracing::warn!(target: "launch", error = %e, "Failed to create distribution cache dir");
            return;
        }
        if let Err(e) = tokio::fs::write(&self.cache_path, content).await {
            tracing::warn!(target: "launch", error = %e, "Failed to write distribution cache");
        }
    }
}

#[async_trait]
impl DistributionSource for DistributionApi {
    async fn load(&self) -> Result<Distribution, DistributionError> {
        self.refresh_or_fallback().await
    }
}
