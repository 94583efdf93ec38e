use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::launcher_config::{LauncherToml, default_config_path};

/// Runtime configuration for Lodestone.
///
/// Resolves `launcher.toml` plus environment and CLI overrides into the paths
/// and endpoints the rest of the launcher works with.
#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    /// Shared game files (libraries, assets).
    pub common_dir: PathBuf,
    /// Per-server game directories.
    pub instances_dir: PathBuf,
    /// Java runtimes installed by the launcher.
    pub runtime_dir: PathBuf,
    pub log_dir: PathBuf,
    pub state_file: PathBuf,
    pub distribution_cache: PathBuf,
    pub verbose: bool,
    toml: LauncherToml,
}

impl Config {
    /// Load configuration. `config_path` and `data_dir` are CLI overrides.
    pub fn load(
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        verbose: bool,
    ) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(default_config_path);
        let toml = LauncherToml::load_or_default(&config_path)?;
        Ok(Self::from_toml(config_path, toml, data_dir, verbose))
    }

    pub fn from_toml(
        config_path: PathBuf,
        toml: LauncherToml,
        data_dir: Option<PathBuf>,
        verbose: bool,
    ) -> Self {
        let data_dir = data_dir
            .or_else(|| toml.data_dir())
            .unwrap_or_else(default_data_dir);

        Self {
            config_path,
            common_dir: data_dir.join("common"),
            instances_dir: data_dir.join("instances"),
            runtime_dir: data_dir.join("runtime"),
            log_dir: data_dir.join("logs"),
            state_file: data_dir.join("settings.json"),
            distribution_cache: data_dir.join("distribution.json"),
            data_dir,
            verbose,
            toml,
        }
    }

    pub fn toml(&self) -> &LauncherToml {
        &self.toml
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.data_dir,
            &self.common_dir,
            &self.instances_dir,
            &self.runtime_dir,
            &self.log_dir,
        ] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn auth_base_url(&self) -> String {
        self.toml.auth_base_url()
    }

    pub fn distribution_url(&self) -> Option<String> {
        self.toml.distribution_url()
    }

    pub fn selected_server(&self) -> Option<&str> {
        self.toml.distribution.selected_server.as_deref()
    }

    pub fn news_feed_url(&self) -> Option<String> {
        self.toml.news_feed_url()
    }

    /// Host prefix for relative article URLs, defaulting to the feed's origin.
    pub fn news_host(&self) -> Option<String> {
        self.toml
            .news
            .host
            .clone()
            .or_else(|| self.news_feed_url().and_then(|url| origin_of(&url)))
    }

    pub fn news_timeout(&self) -> Duration {
        Duration::from_millis(self.toml.news.timeout_ms)
    }

    pub fn news_default_author(&self) -> &str {
        &self.toml.news.default_author
    }

    pub fn status_ping_url(&self) -> Option<&str> {
        self.toml.status.ping_url.as_deref()
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.toml.status.interval_secs.max(1))
    }

    /// Game directory for one server instance.
    pub fn instance_dir(&self, server_id: &str) -> PathBuf {
        self.instances_dir.join(server_id)
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("lodestone"))
        .unwrap_or_else(|| PathBuf::from(".lodestone"))
}

/// `scheme://host[:port]` of a URL.
fn origin_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let host = rest.split('/').next().filter(|h| !h.is_empty())?;
    Some(format!("{scheme}://{host}"))
}
