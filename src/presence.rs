//! Rich-presence collaborators.

use std::sync::{Arc, Mutex};

use crate::distribution::{Distribution, ServerProfile};

/// Trait for presence providers (Discord and the like).
pub trait PresenceProvider: Send + Sync {
    /// Name of this provider, for logging.
    fn name(&self) -> &'static str;

    fn update_details(&self, details: &str);

    /// Clear presence and release the connection. Safe to call repeatedly.
    fn shutdown(&self);
}

/// Presence provider that records transitions in the log.
pub struct LogPresence {
    client_id: String,
    server: String,
    details: Mutex<Option<String>>,
}

impl LogPresence {
    pub fn new(client_id: impl Into<String>, server: impl Into<String>) -> Self {
        let presence = Self {
            client_id: client_id.into(),
            server: server.into(),
            details: Mutex::new(None),
        };
        tracing::info!(target: "launch", client_id = %presence.client_id, server = %presence.server, "Presence initialised");
        presence
    }

    pub fn details(&self) -> Option<String> {
        self.details.lock().ok().and_then(|d| d.clone())
    }
}

impl PresenceProvider for LogPresence {
    fn name(&self) -> &'static str {
        "log"
    }

    fn update_details(&self, details: &str) {
        if let Ok(mut current) = self.details.lock() {
            *current = Some(details.to_string());
        }
        tracing::info!(target: "launch", server = %self.server, details, "Presence updated");
    }

    fn shutdown(&self) {
        let had_details = self
            .details
            .lock()
            .map(|mut d| d.take().is_some())
            .unwrap_or(false);
        if had_details {
            tracing::info!(target: "launch", server = %self.server, "Presence cleared");
        }
    }
}

/// A presence provider for `server`, if both the distribution and the server
/// enable presence.
pub fn for_server(
    distribution: &Distribution,
    server: &ServerProfile,
) -> Option<Arc<dyn PresenceProvider>> {
    if !distribution.presence_enabled(server) {
        return None;
    }
    let settings = distribution.presence.as_ref()?;
    let server_presence = server.presence.as_ref()?;
    Some(Arc::new(LogPresence::new(
        settings.client_id.clone(),
        server_presence.short_id.clone(),
    )))
}
