//! Streaming HTTP downloads and file hashing shared by the Java and repair
//! adapters.

use anyhow::{Context, Result};
use reqwest::Client;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// Stream `url` into `dest`, calling `on_chunk(transferred, content_length)`
/// after every chunk. Returns the number of bytes written.
pub async fn stream_to_file<F>(client: &Client, url: &str, dest: &Path, mut on_chunk: F) -> Result<u64>
where
    F: FnMut(u64, Option<u64>),
{
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("{url} returned an error status"))?;
    let content_length = response.content_length();

    let mut file = File::create(dest)
        .await
        .with_context(|| format!("Failed to create {}", dest.display()))?;
    let mut transferred = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .with_context(|| format!("Failed reading body of {url}"))?
    {
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        transferred += chunk.len() as u64;
        on_chunk(transferred, content_length);
    }

    file.flush().await?;
    Ok(transferred)
}

/// [`stream_to_file`] with `retries` additional attempts.
pub async fn stream_with_retries<F>(
    client: &Client,
    url: &str,
    dest: &Path,
    retries: u32,
    mut on_chunk: F,
) -> Result<u64>
where
    F: FnMut(u64, Option<u64>),
{
    let max_attempts = retries.saturating_add(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match stream_to_file(client, url, dest, &mut on_chunk).await {
            Ok(n) => return Ok(n),
            Err(e) if attempt < max_attempts => {
                tracing::warn!(url, attempt, error = %e, "Download attempt failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}

pub fn sha1_file(path: &Path) -> Result<String> {
    use sha1::{Digest, Sha1};
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha1::new();
    std::io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Hash `path` on the blocking pool with `hash` and compare, case-insensitively,
/// against `expected`.
pub async fn verify_hash(
    path: &Path,
    expected: &str,
    hash: fn(&Path) -> Result<String>,
) -> Result<bool> {
    let owned = path.to_path_buf();
    let actual = tokio::task::spawn_blocking(move || hash(&owned))
        .await
        .context("Hashing task panicked")??;
    Ok(actual.eq_ignore_ascii_case(expected.trim()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use tempfile::tempdir;

    pub(crate) async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_known_digests() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, "abc").unwrap();
        assert_eq!(
            sha1_file(&path).unwrap(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_verify_hash_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, "abc").unwrap();
        assert!(
            verify_hash(&path, "A9993E364706816ABA3E25717850C26C9CD0D89D", sha1_file)
                .await
                .unwrap()
        );
        assert!(!verify_hash(&path, "deadbeef", sha1_file).await.unwrap());
    }

    #[tokio::test]
    async fn test_stream_reports_progress() {
        let body = "x".repeat(64 * 1024);
        let expected = body.len() as u64;
        let app = Router::new().route(
            "/file.bin",
            get(move || {
                let body = body.clone();
                async move { body }
            }),
        );
        let base = serve(app).await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("out/file.bin");
        let mut last = 0;
        let n = stream_to_file(&Client::new(), &format!("{base}/file.bin"), &dest, |t, _| {
            assert!(t >= last);
            last = t;
        })
        .await
        .unwrap();

        assert_eq!(n, expected);
        assert_eq!(last, expected);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), expected);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let base = serve(Router::new()).await;
        let dir = tempdir().unwrap();
        let result = stream_with_retries(
            &Client::new(),
            &format!("{base}/missing"),
            &dir.path().join("missing"),
            1,
            |_, _| {},
        )
        .await;
        assert!(result.is_err());
    }
}
