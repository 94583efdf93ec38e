//! CLI command implementations.
//!
//! | Module    | Commands handled                 |
//! |-----------|----------------------------------|
//! | `auth`    | `Login`, `Logout`, `Accounts`    |
//! | `launch`  | `Launch`                         |
//! | `news`    | `News`                           |
//! | `status`  | `Status`                         |
//! | `config`  | `Config`                         |

pub mod auth;
pub mod config;
pub mod launch;
pub mod news;
pub mod status;

pub use auth::{cmd_accounts, cmd_login, cmd_logout};
pub use config::cmd_config;
pub use launch::cmd_launch;
pub use news::cmd_news;
pub use status::cmd_status;

use anyhow::{Context, Result};
use lodestone::config::Config;
use lodestone::settings::{JsonStateStore, Settings};

/// Load persisted launcher state from the data dir.
pub(crate) fn open_settings(config: &Config) -> Result<Settings> {
    let store = JsonStateStore::new(&config.state_file);
    Settings::load(Box::new(store)).with_context(|| {
        format!(
            "Failed to load launcher settings from {}",
            config.state_file.display()
        )
    })
}
