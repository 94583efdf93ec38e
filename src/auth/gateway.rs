use std::sync::Arc;

use crate::account::{Account, AccountKind};
use crate::errors::AuthError;
use crate::settings::Settings;

use super::provider::AuthProvider;

/// Turns auth provider responses into account store mutations.
pub struct AuthGateway {
    provider: Arc<dyn AuthProvider>,
}

impl AuthGateway {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }

    /// Log in and store the resulting account as the selected one.
    ///
    /// Returns [`AuthError::RequiresTwoFactor`] when the provider asks for a
    /// second factor and `code` was not given; retry with the code.
    pub async fn authenticate(
        &self,
        settings: &mut Settings,
        email: &str,
        password: &str,
        code: Option<&str>,
    ) -> Result<Account, AuthError> {
        let resp = match self.provider.login(email, password, code).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(target: "auth", error = %e, "Login request failed");
                return Err(e);
            }
        };

        if resp.is_pending() && resp.requires_2fa && code.is_none() {
            tracing::info!(target: "auth", "Provider requested a two-factor code");
            return Err(AuthError::RequiresTwoFactor);
        }
        if !resp.is_success() {
            tracing::warn!(target: "auth", status = %resp.status, "Login rejected");
            return Err(AuthError::Rejected { raw: resp.raw });
        }

        let Some(access_token) = non_empty(resp.access_token) else {
            tracing::warn!(target: "auth", "Login succeeded without an access token");
            return Err(AuthError::Rejected { raw: resp.raw });
        };

        let id = non_empty(resp.id);
        let uuid = resolve_uuid(non_empty(resp.uuid), id.as_deref(), email);
        let display_name = non_empty(resp.username).unwrap_or_else(|| email.to_string());

        let account = Account {
            id,
            uuid,
            display_name,
            access_token,
            email: email.to_string(),
            kind: AccountKind::Current,
        };

        let stored = settings.accounts_mut().upsert(account).clone();
        settings.save()?;
        tracing::info!(target: "auth", uuid = %stored.uuid, name = %stored.display_name, "Account added");
        Ok(stored)
    }

    /// Remove an account, invalidating its token remotely first.
    ///
    /// Remote invalidation is best-effort: the local removal happens whatever
    /// the provider says.
    pub async fn deauthenticate(&self, settings: &mut Settings, uuid: &str) -> Result<(), AuthError> {
        let account = settings
            .accounts()
            .get(uuid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownAccount {
                uuid: uuid.to_string(),
            })?;

        if account.kind == AccountKind::Current && !account.access_token.is_empty() {
            if let Err(e) = self.provider.logout(&account.access_token).await {
                tracing::warn!(target: "auth", uuid = %uuid, error = %e, "Remote logout failed; removing account locally");
            }
        } else {
            tracing::debug!(target: "auth", uuid = %uuid, "No remote session to invalidate");
        }

        settings.accounts_mut().remove(uuid);
        settings.save()?;
        tracing::info!(target: "auth", uuid = %uuid, "Account removed");
        Ok(())
    }

    /// Drop a legacy account locally. Legacy tokens are not known to the
    /// provider, so there is nothing to invalidate remotely.
    pub fn remove_legacy_account(&self, settings: &mut Settings, uuid: &str) -> Result<(), AuthError> {
        match settings.accounts().get(uuid) {
            Some(account) if account.kind == AccountKind::Legacy => {}
            _ => {
                return Err(AuthError::UnknownAccount {
                    uuid: uuid.to_string(),
                });
            }
        }
        settings.accounts_mut().remove(uuid);
        settings.save()?;
        tracing::info!(target: "auth", uuid = %uuid, "Legacy account removed");
        Ok(())
    }

    /// Whether the selected account can be used to play.
    ///
    /// Legacy accounts are always invalid. Current accounts are reported
    /// valid without a remote check, since the provider exposes no
    /// validation endpoint.
    pub fn validate_selected(&self, settings: &Settings) -> bool {
        settings.accounts().selected().is_some_and(Account::can_play)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Provider uuid, else provider id, else the email.
pub fn resolve_uuid(uuid: Option<String>, id: Option<&str>, email: &str) -> String {
    uuid.or_else(|| id.map(str::to_string))
        .unwrap_or_else(|| email.to_string())
}
