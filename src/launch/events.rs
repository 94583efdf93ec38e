use async_trait::async_trait;

use super::stage::Stage;
use crate::errors::Displayable;

/// Notifications for the launch area, in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    StageChanged(Stage),
    /// Status text under the progress bar.
    Details(String),
    /// Whether the loading UI should be shown.
    Loading(bool),
    /// Terminal failure. Always preceded by `Loading(false)`.
    Failed(Displayable),
}

/// Answer to the "no compatible Java" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaChoice {
    InstallAutomatically,
    InstallManually,
    Cancel,
}

/// Answer to the "Java is required" follow-up after choosing manual install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualChoice {
    /// Halt the launch.
    Acknowledge,
    /// Go back to checking for Java.
    GoBack,
}

/// Asks the user how to proceed when no compatible Java is installed.
#[async_trait]
pub trait JavaPrompt: Send + Sync {
    async fn missing_java(&self, major: u32) -> JavaChoice;

    async fn confirm_manual(&self, major: u32) -> ManualChoice;
}

/// Non-interactive prompt that always installs automatically.
pub struct AssumeInstall;

#[async_trait]
impl JavaPrompt for AssumeInstall {
    async fn missing_java(&self, _major: u32) -> JavaChoice {
        JavaChoice::InstallAutomatically
    }

    async fn confirm_manual(&self, _major: u32) -> ManualChoice {
        ManualChoice::GoBack
    }
}
