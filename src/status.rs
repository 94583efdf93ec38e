//! Service status polling.

use reqwest::Client;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const PING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Online,
    Offline,
    /// Not checked yet, or no endpoint configured.
    Unknown,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceStatus::Online => "online",
            ServiceStatus::Offline => "offline",
            ServiceStatus::Unknown => "unknown",
        })
    }
}

/// GET `url`; a success status means online.
pub async fn ping(client: &Client, url: &str) -> ServiceStatus {
    match client.get(url).timeout(PING_TIMEOUT).send().await {
        Ok(resp) if resp.status().is_success() => ServiceStatus::Online,
        Ok(resp) => {
            tracing::debug!(target: "launch", url, status = %resp.status(), "Status endpoint returned an error");
            ServiceStatus::Offline
        }
        Err(e) => {
            tracing::debug!(target: "launch", url, error = %e, "Status endpoint unreachable");
            ServiceStatus::Offline
        }
    }
}

/// Periodically pings a status endpoint. The refresh task stops when the
/// monitor is dropped.
pub struct StatusMonitor {
    rx: watch::Receiver<ServiceStatus>,
    handle: JoinHandle<()>,
}

impl StatusMonitor {
    /// Start polling `url` every `interval`, beginning immediately.
    pub fn spawn(url: impl Into<String>, interval: Duration) -> Self {
        let url = url.into();
        let (tx, rx) = watch::channel(ServiceStatus::Unknown);
        let handle = tokio::spawn(async move {
            let client = Client::new();
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let status = ping(&client, &url).await;
                tx.send_if_modified(|current| {
                    if *current != status {
                        tracing::info!(target: "launch", %status, "Service status changed");
                        *current = status;
                        true
                    } else {
                        false
                    }
                });
                if tx.is_closed() {
                    break;
                }
            }
        });
        Self { rx, handle }
    }

    pub fn current(&self) -> ServiceStatus {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceStatus> {
        self.rx.clone()
    }
}

impl Drop for StatusMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
