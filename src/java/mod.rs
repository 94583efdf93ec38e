//! Java runtime discovery and installation.

pub mod system;
pub mod version;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::distribution::JavaOptions;
use crate::progress::ProgressReporter;

pub use system::SystemJavaResolver;

/// A Java installation that satisfied a server's requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JvmDetails {
    pub executable: PathBuf,
    pub version: semver::Version,
}

/// A downloadable JDK archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JdkAsset {
    pub url: String,
    pub file_name: String,
    /// Expected size in bytes.
    pub size: u64,
    /// SHA-256 hex digest.
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JdkDownload {
    pub archive: PathBuf,
    pub transferred: u64,
}

/// Finds or installs a Java runtime.
/// Real implementation: [`SystemJavaResolver`].
#[async_trait]
pub trait JavaResolver: Send + Sync {
    /// Check a specific executable against the requirement.
    async fn validate(&self, executable: &Path, options: &JavaOptions) -> Option<JvmDetails>;

    /// Search known locations for the best compatible installation.
    async fn discover(&self, options: &JavaOptions) -> Result<Option<JvmDetails>>;

    /// Look up the latest JDK for a major version.
    async fn latest_jdk(&self, major: u32) -> Result<JdkAsset>;

    async fn download(&self, asset: &JdkAsset, progress: &ProgressReporter) -> Result<JdkDownload>;

    async fn verify_checksum(&self, archive: &Path, asset: &JdkAsset) -> Result<bool>;

    /// Unpack an archive, returning the executable path it appears to contain.
    async fn extract(&self, archive: &Path, progress: &ProgressReporter) -> Result<PathBuf>;
}
