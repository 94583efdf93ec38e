use anyhow::{Result, bail};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Semaphore;

use super::{IntegrityRepairer, RepairPlan};
use crate::distribution::{Artifact, ServerProfile};
use crate::download::{sha1_file, stream_with_retries, verify_hash};
use crate::progress::ProgressReporter;

const DEFAULT_CONCURRENCY: usize = 8;
const DEFAULT_RETRIES: u32 = 2;

/// Checks distribution artifacts under the common dir by size and SHA-1, and
/// downloads the ones that fail.
#[derive(Clone)]
pub struct ManifestRepairer {
    client: Client,
    common_dir: PathBuf,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    retries: u32,
}

impl ManifestRepairer {
    pub fn new(common_dir: impl Into<PathBuf>) -> Self {
        Self::with_limits(common_dir, DEFAULT_CONCURRENCY, DEFAULT_RETRIES)
    }

    pub fn with_limits(common_dir: impl Into<PathBuf>, concurrency: usize, retries: u32) -> Self {
        let slots = concurrency.max(1);
        Self {
            client: Client::new(),
            common_dir: common_dir.into(),
            semaphore: Arc::new(Semaphore::new(slots)),
            concurrency: slots,
            retries,
        }
    }

    /// Resolve an artifact path from the index under the common dir. Only
    /// plain relative components are accepted.
    fn local_path(&self, artifact: &Artifact) -> Result<PathBuf> {
        let relative = Path::new(&artifact.path);
        if artifact.path.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            bail!(
                "Artifact {} has an unsafe path '{}'",
                artifact.id,
                artifact.path
            );
        }
        Ok(self.common_dir.join(relative))
    }
}

/// Whether the file at `path` matches the artifact's size and hash.
async fn is_valid(path: &Path, artifact: &Artifact) -> bool {
    let Ok(meta) = tokio::fs::metadata(path).await else {
        return false;
    };
    if let Some(size) = artifact.size
        && meta.len() != size
    {
        return false;
    }
    match &artifact.sha1 {
        Some(expected) => verify_hash(path, expected, sha1_file)
            .await
            .unwrap_or(false),
        None => true,
    }
}

#[async_trait]
impl IntegrityRepairer for ManifestRepairer {
    async fn verify(
        &self,
        server: &ServerProfile,
        progress: &ProgressReporter,
    ) -> Result<RepairPlan> {
        let total = server.artifacts.len() as u64;
        let mut plan = RepairPlan::default();

        for (checked, artifact) in server.artifacts.iter().enumerate() {
            let path = self.local_path(artifact)?;
            if !is_valid(&path, artifact).await {
                tracing::debug!(target: "launch", id = %artifact.id, path = %path.display(), "Invalid or missing file");
                plan.invalid.push(artifact.clone());
            }
            progress.bytes(checked as u64 + 1, total);
        }
        progress.set(100);

        tracing::info!(
            target: "launch",
            server = %server.id,
            checked = total,
            invalid = plan.invalid_count(),
            "Verified game files"
        );
        Ok(plan)
    }

    async fn download(&self, plan: &RepairPlan, progress: &ProgressReporter) -> Result<()> {
        if plan.is_empty() {
            progress.set(100);
            return Ok(());
        }

        // Byte-weighted when every size is known, otherwise by file count.
        let sized = plan.invalid.iter().all(|a| a.size.is_some());
        let total: u64 = if sized {
            plan.invalid.iter().filter_map(|a| a.size).sum()
        } else {
            plan.invalid.len() as u64
        };
        let done = Arc::new(AtomicU64::new(0));

        let results = futures::stream::iter(plan.invalid.iter().cloned().map(|artifact| {
            let semaphore = self.semaphore.clone();
            let done = done.clone();
            let progress = progress.clone();
            let dest = self.local_path(&artifact);
            let client = self.client.clone();
            let retries = self.retries;

            async move {
                let dest = dest.map_err(|e| format!("{e:#}"))?;
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Err(format!("{}: download pool closed", artifact.id));
                };

                let mut last = 0u64;
                let fetched = stream_with_retries(&client, &artifact.url, &dest, retries, |n, _| {
                    if sized {
                        // Retries restart from zero; only count forward movement.
                        if n > last {
                            let now = done.fetch_add(n - last, Ordering::SeqCst) + (n - last);
                            progress.bytes(now, total);
                            last = n;
                        }
                    }
                })
                .await;

                if let Err(e) = fetched {
                    return Err(format!("{}: {e:#}", artifact.id));
                }
                if !sized {
                    let now = done.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.bytes(now, total);
                }
                if !is_valid(&dest, &artifact).await {
                    return Err(format!("{}: downloaded file failed verification", artifact.id));
                }
                tracing::debug!(target: "launch", id = %artifact.id, "Downloaded");
                Ok(())
            }
        }))
        .buffer_unordered(self.concurrency)
        .collect::<Vec<_>>()
        .await;

        let failures: Vec<String> = results.into_iter().filter_map(|r| r.err()).collect();
        if !failures.is_empty() {
            for failure in &failures {
                tracing::error!(target: "launch", "{failure}");
            }
            bail!(
                "{} of {} files failed to download",
                failures.len(),
                plan.invalid_count()
            );
        }

        progress.set(100);
        Ok(())
    }
}
