//! `launcher.toml` configuration.
//!
//! Settings are layered file → environment → CLI. The file lives in the
//! platform config dir by default:
//!
//! ```toml
//! [auth]
//! base_url = "https://auth.example.net"
//!
//! [news]
//! feed_url = "https://example.net/feed.xml"
//! host = "https://example.net"
//! timeout_ms = 2500
//! default_author = "Staff"
//!
//! [distribution]
//! url = "https://example.net/distribution.json"
//! selected_server = "main"
//!
//! [status]
//! ping_url = "https://example.net/api/status"
//! interval_secs = 3600
//!
//! [paths]
//! data_dir = "/home/me/.lodestone"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "launcher.toml";

pub const ENV_AUTH_URL: &str = "LODESTONE_AUTH_URL";
pub const ENV_DATA_DIR: &str = "LODESTONE_DATA_DIR";
pub const ENV_DISTRIBUTION_URL: &str = "LODESTONE_DISTRIBUTION_URL";
pub const ENV_NEWS_URL: &str = "LODESTONE_NEWS_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSection {
    /// Base URL of the auth provider; endpoints live under `/api/auth/`.
    #[serde(default = "default_auth_base_url")]
    pub base_url: String,
}

fn default_auth_base_url() -> String {
    "https://auth.example.net".to_string()
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            base_url: default_auth_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSection {
    #[serde(default)]
    pub feed_url: Option<String>,
    /// Prefix used to absolutise relative `src` attributes in article HTML.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_news_timeout_ms")]
    pub timeout_ms: u64,
    /// Shown for articles without a `dc:creator`.
    #[serde(default = "default_news_author")]
    pub default_author: String,
}

fn default_news_timeout_ms() -> u64 {
    2500
}

fn default_news_author() -> String {
    "Staff".to_string()
}

impl Default for NewsSection {
    fn default() -> Self {
        Self {
            feed_url: None,
            host: None,
            timeout_ms: default_news_timeout_ms(),
            default_author: default_news_author(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributionSection {
    /// HTTP(S) URL or local path of the distribution index.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub selected_server: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSection {
    #[serde(default)]
    pub ping_url: Option<String>,
    #[serde(default = "default_status_interval_secs")]
    pub interval_secs: u64,
}

fn default_status_interval_secs() -> u64 {
    3600
}

impl Default for StatusSection {
    fn default() -> Self {
        Self {
            ping_url: None,
            interval_secs: default_status_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsSection {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// The complete launcher.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LauncherToml {
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub news: NewsSection,
    #[serde(default)]
    pub distribution: DistributionSection,
    #[serde(default)]
    pub status: StatusSection,
    #[serde(default)]
    pub paths: PathsSection,
}

impl LauncherToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse launcher.toml")
    }

    /// Returns the default configuration if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize launcher.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Auth base URL (env → file). Trailing slashes are trimmed.
    pub fn auth_base_url(&self) -> String {
        std::env::var(ENV_AUTH_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.auth.base_url.clone())
            .trim_end_matches('/')
            .to_string()
    }

    /// Distribution source (env → file).
    pub fn distribution_url(&self) -> Option<String> {
        std::env::var(ENV_DISTRIBUTION_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.distribution.url.clone())
    }

    /// News feed URL (env → file).
    pub fn news_feed_url(&self) -> Option<String> {
        std::env::var(ENV_NEWS_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.news.feed_url.clone())
    }

    /// Data dir from env or file, if either sets one.
    pub fn data_dir(&self) -> Option<PathBuf> {
        std::env::var(ENV_DATA_DIR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| self.paths.data_dir.clone())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !is_http_url(&self.auth.base_url) {
            warnings.push(format!(
                "Invalid [auth] base_url '{}': expected an http(s) URL",
                self.auth.base_url
            ));
        }
        if let Some(url) = &self.news.feed_url
            && !is_http_url(url)
        {
            warnings.push(format!(
                "Invalid [news] feed_url '{}': expected an http(s) URL",
                url
            ));
        }
        if let Some(host) = &self.news.host
            && !is_http_url(host)
        {
            warnings.push(format!(
                "Invalid [news] host '{}': expected an http(s) URL",
                host
            ));
        }
        if self.news.timeout_ms == 0 {
            warnings.push("[news] timeout_ms must be greater than 0".to_string());
        }
        if let Some(url) = &self.status.ping_url
            && !is_http_url(url)
        {
            warnings.push(format!(
                "Invalid [status] ping_url '{}': expected an http(s) URL",
                url
            ));
        }
        if self.status.interval_secs == 0 {
            warnings.push("[status] interval_secs must be greater than 0".to_string());
        }
        if self.distribution.url.is_none() {
            warnings.push("[distribution] url is not set; launching will not be possible".into());
        }

        warnings
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// `<config dir>/lodestone/launcher.toml`, or `./launcher.toml` when the
/// platform has no config dir.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("lodestone"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE_NAME)
}

#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let toml = LauncherToml::parse("").unwrap();
        assert_eq!(toml.auth.base_url, "https://auth.example.net");
        assert_eq!(toml.news.timeout_ms, 2500);
        assert_eq!(toml.status.interval_secs, 3600);
        assert!(toml.distribution.url.is_none());
    }

    #[test]
    fn test_parse_all_sections() {
        let content = r#"
[auth]
base_url = "https://auth.test/"

[news]
feed_url = "https://site.test/feed.xml"
host = "https://site.test"

[distribution]
url = "/srv/distribution.json"
selected_server = "survival"

[status]
ping_url = "https://site.test/ping"
interval_secs = 60

[paths]
data_dir = "/tmp/lodestone"
"#;
        let toml = LauncherToml::parse(content).unwrap();
        assert_eq!(toml.news.host.as_deref(), Some("https://site.test"));
        assert_eq!(
            toml.distribution.selected_server.as_deref(),
            Some("survival")
        );
        assert_eq!(toml.status.interval_secs, 60);
        assert_eq!(toml.paths.data_dir, Some(PathBuf::from("/tmp/lodestone")));
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(LauncherToml::parse("[auth\nbase_url = ").is_err());
    }

    #[test]
    fn test_validate_reports_bad_urls_and_zero_intervals() {
        let mut toml = LauncherToml::default();
        toml.auth.base_url = "ftp://nope".into();
        toml.news.timeout_ms = 0;
        toml.status.interval_secs = 0;
        let warnings = toml.validate();
        assert!(warnings.iter().any(|w| w.contains("base_url")));
        assert!(warnings.iter().any(|w| w.contains("timeout_ms")));
        assert!(warnings.iter().any(|w| w.contains("interval_secs")));
        assert!(warnings.iter().any(|w| w.contains("[distribution] url")));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut toml = LauncherToml::default();
        toml.distribution.url = Some("https://site.test/distribution.json".into());
        toml.save(&path).unwrap();

        let loaded = LauncherToml::load_or_default(&path).unwrap();
        assert_eq!(
            loaded.distribution.url.as_deref(),
            Some("https://site.test/distribution.json")
        );
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let toml = LauncherToml::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(toml.auth.base_url, default_auth_base_url());
    }

    #[test]
    fn test_env_overrides_auth_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var(ENV_AUTH_URL).ok();

        unsafe { std::env::remove_var(ENV_AUTH_URL) };
        let mut toml = LauncherToml::default();
        toml.auth.base_url = "https://file.test/".into();
        assert_eq!(toml.auth_base_url(), "https://file.test");

        unsafe { std::env::set_var(ENV_AUTH_URL, "https://env.test") };
        assert_eq!(toml.auth_base_url(), "https://env.test");

        match saved {
            Some(val) => unsafe { std::env::set_var(ENV_AUTH_URL, val) },
            None => unsafe { std::env::remove_var(ENV_AUTH_URL) },
        }
    }
}
