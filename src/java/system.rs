use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tokio::process::Command;

use super::version::parse_java_version;
use super::{JavaResolver, JdkAsset, JdkDownload, JvmDetails};
use crate::distribution::JavaOptions;
use crate::download::{sha256_file, stream_to_file, verify_hash};
use crate::progress::ProgressReporter;

pub const ADOPTIUM_API: &str = "https://api.adoptium.net";

#[cfg(windows)]
const JAVA_BIN: &str = "java.exe";
#[cfg(not(windows))]
const JAVA_BIN: &str = "java";

/// Resolves Java from the local system and installs Temurin JDKs into the
/// launcher's runtime dir.
pub struct SystemJavaResolver {
    runtime_dir: PathBuf,
    api_base: String,
    client: Client,
}

impl SystemJavaResolver {
    pub fn new(runtime_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime_dir: runtime_dir.into(),
            api_base: ADOPTIUM_API.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Every place a Java executable might live, most specific first.
    fn candidates(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();

        if let Ok(entries) = std::fs::read_dir(&self.runtime_dir) {
            for entry in entries.flatten() {
                let dir = entry.path();
                if dir.is_dir() {
                    out.push(java_in_home(&dir));
                    out.push(java_in_home(&dir.join("Contents").join("Home")));
                }
            }
        }
        if let Some(home) = std::env::var_os("JAVA_HOME") {
            out.push(java_in_home(Path::new(&home)));
        }
        if let Some(path) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&path) {
                out.push(dir.join(JAVA_BIN));
            }
        }

        let mut seen = std::collections::HashSet::new();
        out.retain(|p| p.is_file() && seen.insert(p.clone()));
        out
    }
}

fn java_in_home(home: &Path) -> PathBuf {
    home.join("bin").join(JAVA_BIN)
}

/// Run `<executable> -version` and parse the reported version.
pub async fn probe_version(executable: &Path) -> Option<semver::Version> {
    if !executable.is_file() {
        return None;
    }
    let output = match Command::new(executable).arg("-version").output().await {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(target: "launch", path = %executable.display(), error = %e, "Java probe failed");
            return None;
        }
    };
    // -version prints to stderr; some wrappers use stdout.
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_java_version(&stderr).or_else(|| parse_java_version(&stdout))
}

fn adoptium_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "mac",
        other => other,
    }
}

fn adoptium_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        other => other,
    }
}

#[derive(Debug, Deserialize)]
struct AdoptiumRelease {
    binary: AdoptiumBinary,
}

#[derive(Debug, Deserialize)]
struct AdoptiumBinary {
    package: AdoptiumPackage,
}

#[derive(Debug, Deserialize)]
struct AdoptiumPackage {
    link: String,
    name: String,
    size: u64,
    checksum: String,
}

#[async_trait]
impl JavaResolver for SystemJavaResolver {
    async fn validate(&self, executable: &Path, options: &JavaOptions) -> Option<JvmDetails> {
        let req = match options.version_req() {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(target: "launch", supported = %options.supported, error = %e, "Invalid Java requirement");
                return None;
            }
        };
        let version = probe_version(executable).await?;
        if req.matches(&version) {
            Some(JvmDetails {
                executable: executable.to_path_buf(),
                version,
            })
        } else {
            tracing::debug!(target: "launch", path = %executable.display(), %version, "Java version does not satisfy requirement");
            None
        }
    }

    async fn discover(&self, options: &JavaOptions) -> Result<Option<JvmDetails>> {
        let mut best: Option<JvmDetails> = None;
        for candidate in self.candidates() {
            if let Some(details) = self.validate(&candidate, options).await
                && best.as_ref().is_none_or(|b| details.version > b.version)
            {
                best = Some(details);
            }
        }
        if let Some(found) = &best {
            tracing::info!(target: "launch", path = %found.executable.display(), version = %found.version, "Found compatible Java");
        }
        Ok(best)
    }

    async fn latest_jdk(&self, major: u32) -> Result<JdkAsset> {
        let url = format!("{}/v3/assets/latest/{major}/hotspot", self.api_base);
        let releases: Vec<AdoptiumRelease> = self
            .client
            .get(&url)
            .query(&[
                ("vendor", "eclipse"),
                ("image_type", "jdk"),
                ("os", adoptium_os()),
                ("architecture", adoptium_arch()),
            ])
            .send()
            .await
            .context("Failed to query Adoptium")?
            .error_for_status()
            .context("Adoptium returned an error status")?
            .json()
            .await
            .context("Failed to parse Adoptium response")?;

        let package = releases
            .into_iter()
            .map(|r| r.binary.package)
            .find(|p| p.name.ends_with(".tar.gz"))
            .with_context(|| format!("No .tar.gz JDK {major} build available"))?;

        Ok(JdkAsset {
            url: package.link,
            file_name: package.name,
            size: package.size,
            sha256: package.checksum,
        })
    }

    async fn download(&self, asset: &JdkAsset, progress: &ProgressReporter) -> Result<JdkDownload> {
        let archive = self.runtime_dir.join(&asset.file_name);
        let transferred = stream_to_file(&self.client, &asset.url, &archive, |done, _| {
            progress.bytes(done, asset.size);
        })
        .await?;
        Ok(JdkDownload {
            archive,
            transferred,
        })
    }

    async fn verify_checksum(&self, archive: &Path, asset: &JdkAsset) -> Result<bool> {
        verify_hash(archive, &asset.sha256, sha256_file).await
    }

    async fn extract(&self, archive: &Path, progress: &ProgressReporter) -> Result<PathBuf> {
        let archive_path = archive.to_path_buf();
        let dest = self.runtime_dir.clone();
        let home = tokio::task::spawn_blocking(move || unpack_tar_gz(&archive_path, &dest))
            .await
            .context("Extraction task panicked")??;
        progress.set(100);

        if let Err(e) = tokio::fs::remove_file(archive).await {
            tracing::warn!(target: "launch", path = %archive.display(), error = %e, "Failed to remove JDK archive");
        }

        let mac_home = home.join("Contents").join("Home");
        let home = if mac_home.is_dir() { mac_home } else { home };
        Ok(java_in_home(&home))
    }
}

/// Unpack into `dest`, returning the archive's top-level directory.
fn unpack_tar_gz(archive: &Path, dest: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dest)?;
    let file = std::fs::File::open(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));

    let mut top: Option<PathBuf> = None;
    for entry in tar.entries().context("Failed to read JDK archive")? {
        let mut entry = entry.context("Corrupt entry in JDK archive")?;
        if top.is_none() {
            let path = entry.path()?.into_owned();
            top = path
                .components()
                .find(|c| matches!(c, Component::Normal(_)))
                .map(|c| PathBuf::from(c.as_os_str()));
        }
        entry
            .unpack_in(dest)
            .context("Failed to unpack JDK archive entry")?;
    }

    match top {
        Some(top) => Ok(dest.join(top)),
        None => bail!("JDK archive {} is empty", archive.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::tests::serve;
    use axum::{Json, Router, routing::get};
    use flate2::{Compression, write::GzEncoder};
    use tempfile::tempdir;

    fn jdk_tarball(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        let body = b"#!/bin/sh\necho 'openjdk version \"17.0.8\"' >&2\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, "jdk-17.0.8+7/bin/java", &body[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[cfg(unix)]
    fn fake_java(dir: &Path, version: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let bin = dir.join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let exe = bin.join("java");
        std::fs::write(
            &exe,
            format!("#!/bin/sh\necho 'openjdk version \"{version}\" 2099-01-01' >&2\n"),
        )
        .unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        exe
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_returns_java_under_top_level_dir() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("jdk.tar.gz");
        jdk_tarball(&archive);

        let resolver = SystemJavaResolver::new(dir.path().join("runtime"));
        let progress = ProgressReporter::detached();
        let exe = resolver.extract(&archive, &progress).await.unwrap();

        assert_eq!(
            exe,
            dir.path().join("runtime/jdk-17.0.8+7/bin").join(JAVA_BIN)
        );
        assert!(exe.exists());
        assert!(!archive.exists());
        assert_eq!(progress.current(), 100);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_validate_checks_requirement() {
        let dir = tempdir().unwrap();
        let exe = fake_java(dir.path(), "17.0.8");
        let resolver = SystemJavaResolver::new(dir.path().join("runtime"));

        let ok = JavaOptions::default();
        let details = resolver.validate(&exe, &ok).await.unwrap();
        assert_eq!(details.version, semver::Version::new(17, 0, 8));

        let too_new = JavaOptions {
            supported: ">=21".into(),
            ..JavaOptions::default()
        };
        assert!(resolver.validate(&exe, &too_new).await.is_none());
        assert!(
            resolver
                .validate(&dir.path().join("missing"), &ok)
                .await
                .is_none()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_discover_prefers_highest_runtime() {
        let dir = tempdir().unwrap();
        let runtime = dir.path().join("runtime");
        fake_java(&runtime.join("jdk-a"), "90.0.1");
        let newest = fake_java(&runtime.join("jdk-b"), "99.0.2");

        let resolver = SystemJavaResolver::new(&runtime);
        let options = JavaOptions {
            supported: ">=90".into(),
            ..JavaOptions::default()
        };
        let found = resolver.discover(&options).await.unwrap().unwrap();
        assert_eq!(found.executable, newest);
        assert_eq!(found.version, semver::Version::new(99, 0, 2));
    }

    #[tokio::test]
    async fn test_latest_jdk_picks_tarball() {
        let app = Router::new().route(
            "/v3/assets/latest/17/hotspot",
            get(|| async {
                Json(serde_json::json!([
                    { "binary": { "package": {
                        "link": "https://cdn.test/jdk.zip", "name": "jdk.zip",
                        "size": 10, "checksum": "aa" } } },
                    { "binary": { "package": {
                        "link": "https://cdn.test/jdk.tar.gz", "name": "jdk.tar.gz",
                        "size": 20, "checksum": "bb" } } }
                ]))
            }),
        );
        let base = serve(app).await;
        let dir = tempdir().unwrap();
        let resolver = SystemJavaResolver::new(dir.path()).with_api_base(base);

        let asset = resolver.latest_jdk(17).await.unwrap();
        assert_eq!(asset.file_name, "jdk.tar.gz");
        assert_eq!(asset.size, 20);
        assert_eq!(asset.sha256, "bb");

        assert!(resolver.latest_jdk(8).await.is_err());
    }

    #[tokio::test]
    async fn test_download_and_checksum() {
        let payload = b"jdk-bytes".to_vec();
        let served = payload.clone();
        let app = Router::new().route(
            "/jdk.tar.gz",
            get(move || {
                let body = served.clone();
                async move { body }
            }),
        );
        let base = serve(app).await;
        let dir = tempdir().unwrap();
        let resolver = SystemJavaResolver::new(dir.path());

        let archive = dir.path().join("expected");
        std::fs::write(&archive, &payload).unwrap();
        let sha256 = sha256_file(&archive).unwrap();

        let asset = JdkAsset {
            url: format!("{base}/jdk.tar.gz"),
            file_name: "jdk.tar.gz".into(),
            size: payload.len() as u64,
            sha256,
        };
        let (progress, rx) = ProgressReporter::new();
        let dl = resolver.download(&asset, &progress).await.unwrap();
        assert_eq!(dl.transferred, payload.len() as u64);
        assert_eq!(*rx.borrow(), 100);
        assert!(resolver.verify_checksum(&dl.archive, &asset).await.unwrap());
    }
}
