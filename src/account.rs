//! Stored accounts and the current selection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which backend issued an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Issued by the current auth provider.
    #[default]
    Current,
    /// Older account type that can no longer be used to play.
    Legacy,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable user id from the provider, when it sends one.
    #[serde(default)]
    pub id: Option<String>,
    /// Key for this account: provider uuid, else id, else email.
    pub uuid: String,
    pub display_name: String,
    pub access_token: String,
    pub email: String,
    #[serde(default)]
    pub kind: AccountKind,
}

impl Account {
    /// Legacy accounts can still be listed and removed but not played.
    pub fn can_play(&self) -> bool {
        self.kind == AccountKind::Current
    }
}

// access_token stays out of logs and panic messages.
impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("uuid", &self.uuid)
            .field("display_name", &self.display_name)
            .field("access_token", &"<redacted>")
            .field("email", &self.email)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Zero-or-one selected account plus every stored account, keyed by uuid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountStore {
    #[serde(default)]
    accounts: BTreeMap<String, Account>,
    #[serde(default)]
    selected: Option<String>,
}

impl AccountStore {
    /// Insert or replace the account with the same uuid and select it.
    pub fn upsert(&mut self, account: Account) -> &Account {
        let key = account.uuid.clone();
        self.accounts.insert(key.clone(), account);
        self.selected = Some(key.clone());
        &self.accounts[&key]
    }

    /// Remove an account. If it was selected, the first remaining account
    /// (by uuid order) becomes selected.
    pub fn remove(&mut self, uuid: &str) -> Option<Account> {
        let removed = self.accounts.remove(uuid)?;
        if self.selected.as_deref() == Some(uuid) {
            self.selected = self.accounts.keys().next().cloned();
        }
        Some(removed)
    }

    pub fn get(&self, uuid: &str) -> Option<&Account> {
        self.accounts.get(uuid)
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.accounts.contains_key(uuid)
    }

    pub fn selected(&self) -> Option<&Account> {
        self.selected.as_deref().and_then(|key| self.accounts.get(key))
    }

    /// Select a stored account. Returns `false` if no account has that uuid.
    pub fn select(&mut self, uuid: &str) -> bool {
        if self.accounts.contains_key(uuid) {
            self.selected = Some(uuid.to_string());
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
