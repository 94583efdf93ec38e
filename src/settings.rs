//! Persisted launcher state: accounts, per-server Java executables, news cache.
//!
//! [`Settings`] owns the in-memory [`LauncherState`] and writes it back through
//! a [`StateStore`]. Mutations are local until [`Settings::save`] is called.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fs2::FileExt;

use crate::account::AccountStore;
use crate::errors::StoreError;
use crate::news::NewsCache;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LauncherState {
    #[serde(default)]
    pub accounts: AccountStore,
    /// Java executable chosen for each server id.
    #[serde(default)]
    pub java_executables: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub news_cache: Option<NewsCache>,
    #[serde(default)]
    pub client_token: Option<String>,
    #[serde(default)]
    pub selected_server: Option<String>,
}

/// Backing storage for [`LauncherState`].
pub trait StateStore: Send + Sync {
    /// Returns `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<LauncherState>, StoreError>;
    fn save(&self, state: &LauncherState) -> Result<(), StoreError>;
}

/// JSON file store. Writes go to a temp file that is renamed over the target,
/// under an exclusive lock on a sibling `.lock` file.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn lock(&self) -> Result<File, StoreError> {
        let lock_path = self.path.with_extension("lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| self.io_err(e))?;
        file.try_lock_exclusive().map_err(|_| StoreError::Locked {
            path: self.path.clone(),
        })?;
        Ok(file)
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<Option<LauncherState>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_err(e))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let state = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(state))
    }

    fn save(&self, state: &LauncherState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let _lock = self.lock()?;

        let json = serde_json::to_string_pretty(state).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "settings.json".to_string());
        let tmp_path = self.path.with_file_name(format!(".{file_name}.tmp"));

        let mut tmp = File::create(&tmp_path).map_err(|e| self.io_err(e))?;
        tmp.write_all(json.as_bytes()).map_err(|e| self.io_err(e))?;
        tmp.sync_all().map_err(|e| self.io_err(e))?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_err(e))?;
        Ok(())
    }
}

/// In-memory store. Clones share the same state and save counter.
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    state: Arc<Mutex<Option<LauncherState>>>,
    saves: Arc<AtomicUsize>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every subsequent save fail with an I/O error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Option<LauncherState> {
        self.state.lock().ok().and_then(|guard| guard.clone())
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<LauncherState>, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &LauncherState) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::other("save disabled"),
            });
        }
        if let Ok(mut guard) = self.state.lock() {
            *guard = Some(state.clone());
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Loaded launcher state plus the store it came from.
pub struct Settings {
    store: Box<dyn StateStore>,
    state: LauncherState,
}

impl Settings {
    /// Load state from `store`, starting empty if nothing was saved yet.
    /// A client token is generated on first load.
    pub fn load(store: Box<dyn StateStore>) -> Result<Self, StoreError> {
        let mut state = store.load()?.unwrap_or_default();
        if state.client_token.is_none() {
            state.client_token = Some(uuid::Uuid::new_v4().simple().to_string());
        }
        Ok(Self { store, state })
    }

    /// Settings backed by a fresh [`MemoryStateStore`].
    pub fn in_memory() -> Self {
        Self {
            store: Box::new(MemoryStateStore::new()),
            state: LauncherState {
                client_token: Some(uuid::Uuid::new_v4().simple().to_string()),
                ..LauncherState::default()
            },
        }
    }

    pub fn save(&self) -> Result<(), StoreError> {
        self.store.save(&self.state)
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.state.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut AccountStore {
        &mut self.state.accounts
    }

    pub fn java_executable(&self, server_id: &str) -> Option<&Path> {
        self.state
            .java_executables
            .get(server_id)
            .map(PathBuf::as_path)
    }

    pub fn set_java_executable(&mut self, server_id: &str, path: impl Into<PathBuf>) {
        self.state
            .java_executables
            .insert(server_id.to_string(), path.into());
    }

    pub fn news_cache(&self) -> Option<&NewsCache> {
        self.state.news_cache.as_ref()
    }

    pub fn set_news_cache(&mut self, cache: NewsCache) {
        self.state.news_cache = Some(cache);
    }

    pub fn client_token(&self) -> &str {
        self.state.client_token.as_deref().unwrap_or_default()
    }

    pub fn selected_server(&self) -> Option<&str> {
        self.state.selected_server.as_deref()
    }

    pub fn set_selected_server(&mut self, server_id: Option<String>) {
        self.state.selected_server = server_id;
    }
}
