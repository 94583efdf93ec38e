//! Game process construction and supervision.

pub mod command;
pub mod markers;
pub mod supervisor;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::account::Account;
use crate::distribution::ServerProfile;
use crate::errors::LaunchError;
use crate::presence::PresenceProvider;

pub use command::GameCommand;
pub use markers::{MIN_LINGER, Marker, OutputMonitor, OutputStream};
pub use supervisor::{GameEvent, GameProcess, ProcessSupervisor};

/// Everything needed to start the game for one server.
pub struct LaunchRequest<'a> {
    pub server: &'a ServerProfile,
    pub account: &'a Account,
    pub java: &'a Path,
    pub presence: Option<Arc<dyn PresenceProvider>>,
}

/// Starts the game process for a validated server.
#[async_trait]
pub trait GameLauncher: Send + Sync {
    async fn launch(&self, request: LaunchRequest<'_>) -> Result<GameProcess, LaunchError>;
}

/// Launches the JVM from the server's launch template.
pub struct ProcessLauncher {
    supervisor: ProcessSupervisor,
    common_dir: PathBuf,
    instances_dir: PathBuf,
}

impl ProcessLauncher {
    pub fn new(
        supervisor: ProcessSupervisor,
        common_dir: impl Into<PathBuf>,
        instances_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            supervisor,
            common_dir: common_dir.into(),
            instances_dir: instances_dir.into(),
        }
    }
}

#[async_trait]
impl GameLauncher for ProcessLauncher {
    async fn launch(&self, request: LaunchRequest<'_>) -> Result<GameProcess, LaunchError> {
        let game_dir = self.instances_dir.join(&request.server.id);
        tokio::fs::create_dir_all(&game_dir)
            .await
            .map_err(|e| LaunchError::ProcessLaunch {
                message: format!("{}: {e}", game_dir.display()),
            })?;

        let command = GameCommand::build(
            request.java,
            request.server,
            request.account,
            &self.common_dir,
            &game_dir,
        )?;
        tracing::debug!(
            target: "launch",
            program = %command.program.display(),
            args = ?command.redacted_args(&request.account.access_token),
            "Game command"
        );

        self.supervisor
            .spawn(&command, &request.account.display_name, request.presence)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::account::AccountKind;
    use crate::distribution::{JavaOptions, LaunchTemplate};
    use std::time::Duration;

    #[tokio::test]
    async fn test_process_launcher_creates_game_dir_and_runs() {
        let dir = tempfile::tempdir().unwrap();
        let server = ServerProfile {
            id: "survival".into(),
            name: "Survival".into(),
            description: String::new(),
            game_version: "1.20.1".into(),
            address: None,
            main_server: true,
            java: JavaOptions::default(),
            presence: None,
            launch: LaunchTemplate {
                // `sh -c <script>` stands in for `java <main class>`
                main_class: "-c".into(),
                classpath: vec![],
                jvm_args: vec![],
                game_args: vec!["pwd; exit 0".into()],
            },
            artifacts: vec![],
        };
        let account = Account {
            id: None,
            uuid: "u".into(),
            display_name: "Steve".into(),
            access_token: "t".into(),
            email: "s@example.com".into(),
            kind: AccountKind::Current,
        };

        let launcher = ProcessLauncher::new(
            ProcessSupervisor::new().with_min_linger(Duration::ZERO),
            dir.path().join("common"),
            dir.path().join("instances"),
        );
        let process = launcher
            .launch(LaunchRequest {
                server: &server,
                account: &account,
                java: Path::new("sh"),
                presence: None,
            })
            .await
            .unwrap();

        assert_eq!(process.wait().await, Some(0));
        assert!(dir.path().join("instances/survival").is_dir());
    }
}
