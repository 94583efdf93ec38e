//! `lodestone launch`.

use anyhow::{Result, bail};
use console::style;
use std::sync::Arc;
use tokio::sync::mpsc;

use lodestone::config::Config;
use lodestone::distribution::DistributionApi;
use lodestone::java::SystemJavaResolver;
use lodestone::launch::{
    AssumeInstall, JavaPrompt, LaunchOrchestrator, LaunchOutcome, LaunchServices,
};
use lodestone::process::{ProcessLauncher, ProcessSupervisor};
use lodestone::progress::ProgressReporter;
use lodestone::repair::ManifestRepairer;
use lodestone::ui::{TerminalPrompt, TerminalUi};

use super::auth::gateway;
use super::open_settings;

pub async fn cmd_launch(config: &Config, server: Option<String>, assume_yes: bool) -> Result<()> {
    let mut settings = open_settings(config)?;
    // Refuse unusable accounts before any Java or file downloads.
    if let Some(account) = settings.accounts().selected()
        && !gateway(config)?.validate_selected(&settings)
    {
        bail!(
            "{} is a legacy account and cannot be used to play. Run 'lodestone login' with a current account.",
            account.display_name
        );
    }
    let explicit = server.is_some();
    let server_id = server
        .or_else(|| settings.selected_server().map(str::to_string))
        .or_else(|| config.selected_server().map(str::to_string));

    let ui = TerminalUi::new(config.verbose);
    let prompt: Arc<dyn JavaPrompt> = if assume_yes {
        Arc::new(AssumeInstall)
    } else {
        Arc::new(TerminalPrompt::new(ui.bar()))
    };
    let services = LaunchServices {
        distribution: Arc::new(DistributionApi::new(
            config.distribution_url(),
            &config.distribution_cache,
        )),
        java: Arc::new(SystemJavaResolver::new(&config.runtime_dir)),
        repairer: Arc::new(ManifestRepairer::new(&config.common_dir)),
        launcher: Arc::new(ProcessLauncher::new(
            ProcessSupervisor::new(),
            &config.common_dir,
            &config.instances_dir,
        )),
        prompt,
    };

    let (progress, progress_rx) = ProgressReporter::new();
    let (tx, rx) = mpsc::channel(64);
    let mut orchestrator = LaunchOrchestrator::new(services)
        .with_event_channel(tx)
        .with_progress(progress)
        .with_server(server_id.clone());

    let ui_task = tokio::spawn(ui.run(rx, progress_rx));
    let outcome = orchestrator.launch(&mut settings).await;
    drop(orchestrator);
    ui_task.await.ok();
    tracing::info!(target: "launch", kind = ?outcome.kind(), "Launch finished");

    match outcome {
        LaunchOutcome::Completed { loaded, exit_code } => {
            if explicit {
                settings.set_selected_server(server_id);
                settings.save()?;
            }
            match (loaded, exit_code) {
                (true, Some(0)) | (false, _) => println!("{}", style("Game closed.").dim()),
                (true, code) => println!(
                    "{}",
                    style(format!("Game closed with exit code {code:?}.")).dim()
                ),
            }
            Ok(())
        }
        LaunchOutcome::Cancelled => Ok(()),
        LaunchOutcome::Failed { kind, .. } => bail!("Launch failed ({kind:?})"),
    }
}
