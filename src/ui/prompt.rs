use async_trait::async_trait;
use console::style;
use dialoguer::{Select, theme::ColorfulTheme};
use indicatif::ProgressBar;

use crate::launch::{JavaChoice, JavaPrompt, ManualChoice};
use crate::messages;

/// Java prompts rendered with dialoguer. The launch spinner is suspended while
/// a prompt is on screen.
pub struct TerminalPrompt {
    bar: ProgressBar,
}

impl TerminalPrompt {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }

    /// Show a two-option prompt. `None` when the prompt was dismissed or the
    /// terminal is not interactive.
    async fn select(&self, title: &'static str, body: String, options: [&'static str; 2]) -> Option<usize> {
        let bar = self.bar.clone();
        let result = tokio::task::spawn_blocking(move || {
            bar.suspend(|| {
                println!();
                println!("{}", style(title).yellow().bold());
                println!("{body}");
                Select::with_theme(&ColorfulTheme::default())
                    .items(&options)
                    .default(0)
                    .interact_opt()
            })
        })
        .await;

        match result {
            Ok(Ok(selection)) => selection,
            Ok(Err(e)) => {
                tracing::warn!(target: "launch", error = %e, "Prompt failed");
                None
            }
            Err(e) => {
                tracing::warn!(target: "launch", error = %e, "Prompt task failed");
                None
            }
        }
    }
}

#[async_trait]
impl JavaPrompt for TerminalPrompt {
    async fn missing_java(&self, major: u32) -> JavaChoice {
        let selection = self
            .select(
                messages::NO_COMPATIBLE_JAVA_TITLE,
                messages::install_java_message(major),
                [messages::INSTALL_JAVA, messages::INSTALL_JAVA_MANUALLY],
            )
            .await;
        match selection {
            Some(0) => JavaChoice::InstallAutomatically,
            Some(_) => JavaChoice::InstallManually,
            None => JavaChoice::Cancel,
        }
    }

    async fn confirm_manual(&self, major: u32) -> ManualChoice {
        let selection = self
            .select(
                messages::JAVA_REQUIRED_TITLE,
                messages::java_required_message(major),
                [
                    messages::JAVA_REQUIRED_ACKNOWLEDGE,
                    messages::JAVA_REQUIRED_GO_BACK,
                ],
            )
            .await;
        match selection {
            Some(1) => ManualChoice::GoBack,
            _ => ManualChoice::Acknowledge,
        }
    }
}
