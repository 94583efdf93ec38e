use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use super::events::{JavaChoice, JavaPrompt, LaunchEvent, ManualChoice};
use super::stage::{LaunchOutcome, Stage};
use crate::distribution::{DistributionSource, ServerProfile};
use crate::errors::LaunchError;
use crate::java::{JavaResolver, JvmDetails};
use crate::messages;
use crate::presence;
use crate::process::{GameEvent, GameLauncher, GameProcess, LaunchRequest};
use crate::progress::ProgressReporter;
use crate::repair::IntegrityRepairer;
use crate::settings::Settings;

/// Collaborators used by the launch sequence.
pub struct LaunchServices {
    pub distribution: Arc<dyn DistributionSource>,
    pub java: Arc<dyn JavaResolver>,
    pub repairer: Arc<dyn IntegrityRepairer>,
    pub launcher: Arc<dyn GameLauncher>,
    pub prompt: Arc<dyn JavaPrompt>,
}

/// Drives one server launch from Java discovery to game exit.
pub struct LaunchOrchestrator {
    services: LaunchServices,
    progress: ProgressReporter,
    event_tx: Option<mpsc::Sender<LaunchEvent>>,
    server_id: Option<String>,
    presence: bool,
    stage: Stage,
}

impl LaunchOrchestrator {
    pub fn new(services: LaunchServices) -> Self {
        Self {
            services,
            progress: ProgressReporter::detached(),
            event_tx: None,
            server_id: None,
            presence: true,
            stage: Stage::Idle,
        }
    }

    /// Set an event channel for stage and detail updates.
    pub fn with_event_channel(mut self, tx: mpsc::Sender<LaunchEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Launch this server instead of the stored selection.
    pub fn with_server(mut self, server_id: Option<String>) -> Self {
        self.server_id = server_id;
        self
    }

    pub fn with_presence(mut self, enabled: bool) -> Self {
        self.presence = enabled;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    /// Run the launch sequence to completion.
    ///
    /// Returns once the game process has exited, or earlier when a stage
    /// fails or the user cancels. Failures are reported through the outcome
    /// and the event channel, never as an error.
    pub async fn launch(&mut self, settings: &mut Settings) -> LaunchOutcome {
        self.stage = Stage::Idle;
        self.emit_event(LaunchEvent::Loading(true)).await;
        self.details(messages::PLEASE_WAIT).await;

        match self.run(settings).await {
            Ok(outcome) => outcome,
            Err(e) => self.fail(e).await,
        }
    }

    async fn run(&mut self, settings: &mut Settings) -> Result<LaunchOutcome, LaunchError> {
        self.details(messages::LOADING_SERVER_INFO).await;
        let distribution = self.services.distribution.load().await?;
        let server_id = self
            .server_id
            .clone()
            .or_else(|| settings.selected_server().map(str::to_string));
        let server = distribution.select_server(server_id.as_deref())?.clone();
        tracing::info!(target: "launch", server = %server.id, "Starting launch");

        let Some(jvm) = self.resolve_java(settings, &server).await? else {
            return Ok(self.cancel().await);
        };
        self.enter(Stage::JavaOk).await;
        tracing::info!(target: "launch", java = %jvm.executable.display(), version = %jvm.version, "Using Java");

        self.validate_files(&server).await?;

        self.enter(Stage::Launching).await;
        self.details(messages::PREPARING_TO_LAUNCH).await;
        let account = settings
            .accounts()
            .selected()
            .cloned()
            .ok_or(LaunchError::NoAccountSelected)?;
        if !account.can_play() {
            return Err(LaunchError::LegacyAccount {
                uuid: account.uuid,
            });
        }
        let presence = if self.presence {
            presence::for_server(&distribution, &server)
        } else {
            None
        };

        self.details(messages::LAUNCHING_GAME).await;
        let process = self
            .services
            .launcher
            .launch(LaunchRequest {
                server: &server,
                account: &account,
                java: &jvm.executable,
                presence,
            })
            .await?;

        Ok(self.monitor(process).await)
    }

    /// Loop until a compatible Java is found. `None` means the user halted.
    async fn resolve_java(
        &mut self,
        settings: &mut Settings,
        server: &ServerProfile,
    ) -> Result<Option<JvmDetails>, LaunchError> {
        let major = server.java.suggested_major;
        let mut installed = false;

        loop {
            self.enter(Stage::JavaCheck).await;
            self.details(messages::CHECKING_SYSTEM).await;
            if let Some(jvm) = self.check_java(settings, server).await? {
                return Ok(Some(jvm));
            }
            if installed {
                return Err(LaunchError::JavaAcquisition {
                    message: format!("The installed Java {major} runtime could not be validated."),
                });
            }

            self.enter(Stage::JavaMissing).await;
            match self.services.prompt.missing_java(major).await {
                JavaChoice::InstallAutomatically => {
                    let executable = self.install_java(major).await?;
                    settings.set_java_executable(&server.id, &executable);
                    persist(settings);
                    installed = true;
                }
                JavaChoice::InstallManually => match self.services.prompt.confirm_manual(major).await
                {
                    ManualChoice::Acknowledge => return Ok(None),
                    ManualChoice::GoBack => {
                        tracing::debug!(target: "launch", "Rechecking Java");
                    }
                },
                JavaChoice::Cancel => return Ok(None),
            }
        }
    }

    /// Validate the configured executable, else discover one and remember it.
    async fn check_java(
        &self,
        settings: &mut Settings,
        server: &ServerProfile,
    ) -> Result<Option<JvmDetails>, LaunchError> {
        if let Some(configured) = settings.java_executable(&server.id).map(Path::to_path_buf) {
            if let Some(jvm) = self.services.java.validate(&configured, &server.java).await {
                return Ok(Some(jvm));
            }
            tracing::warn!(target: "launch", path = %configured.display(), "Configured Java is not compatible");
        }

        let discovered = self
            .services
            .java
            .discover(&server.java)
            .await
            .map_err(acquisition)?;
        if let Some(jvm) = &discovered {
            settings.set_java_executable(&server.id, &jvm.executable);
            persist(settings);
        }
        Ok(discovered)
    }

    async fn install_java(&mut self, major: u32) -> Result<PathBuf, LaunchError> {
        self.enter(Stage::JavaDownloading).await;
        self.details(messages::JAVA_DOWNLOAD_PREPARE).await;
        let java = self.services.java.clone();

        let asset = java.latest_jdk(major).await.map_err(|e| {
            tracing::error!(target: "launch", error = %format!("{e:#}"), major, "JDK lookup failed");
            LaunchError::JavaAcquisition {
                message: messages::FIND_JDK_FAILURE.to_string(),
            }
        })?;

        self.details(messages::DOWNLOADING_JAVA).await;
        let download = java
            .download(&asset, &self.progress)
            .await
            .map_err(acquisition)?;

        if download.transferred != asset.size {
            let matches = java
                .verify_checksum(&download.archive, &asset)
                .await
                .map_err(acquisition)?;
            if !matches {
                return Err(LaunchError::JavaChecksumMismatch {
                    path: download.archive,
                });
            }
            tracing::warn!(
                target: "launch",
                expected = asset.size,
                transferred = download.transferred,
                "JDK size differs from the advertised size but the checksum matches"
            );
        }

        self.enter(Stage::JavaExtracting).await;
        self.details(messages::EXTRACTING_JAVA).await;
        let executable = java
            .extract(&download.archive, &self.progress)
            .await
            .map_err(acquisition)?;
        self.details(messages::JAVA_INSTALLED).await;
        tracing::info!(target: "launch", path = %executable.display(), "Java installed");
        Ok(executable)
    }

    async fn validate_files(&mut self, server: &ServerProfile) -> Result<(), LaunchError> {
        self.enter(Stage::ValidatingFiles).await;
        self.details(messages::VALIDATING_FILES).await;
        let repairer = self.services.repairer.clone();

        let plan = repairer
            .verify(server, &self.progress)
            .await
            .map_err(|e| LaunchError::FileVerification {
                message: format!("{e:#}"),
            })?;
        if plan.is_empty() {
            return Ok(());
        }

        self.enter(Stage::DownloadingFiles).await;
        self.details(messages::DOWNLOADING_FILES).await;
        repairer
            .download(&plan, &self.progress)
            .await
            .map_err(|e| LaunchError::FileDownload {
                message: format!("{e:#}"),
            })
    }

    /// Consume process events until exit.
    async fn monitor(&mut self, mut process: GameProcess) -> LaunchOutcome {
        self.enter(Stage::Monitoring).await;
        let mut failure: Option<LaunchOutcome> = None;

        while let Some(event) = process.next_event().await {
            match event {
                GameEvent::LoadingComplete => {
                    self.enter(Stage::Done).await;
                    self.details(messages::DONE_ENJOY).await;
                    self.emit_event(LaunchEvent::Loading(false)).await;
                }
                GameEvent::Fatal(e) => {
                    if failure.is_none() {
                        failure = Some(self.fail(e).await);
                    }
                }
                GameEvent::Exited {
                    code,
                    launch_completed,
                } => {
                    if let Some(outcome) = failure {
                        return outcome;
                    }
                    if launch_completed {
                        if code != Some(0) {
                            tracing::warn!(target: "launch", ?code, "Game exited with a non-zero code");
                        }
                        return LaunchOutcome::Completed {
                            loaded: true,
                            exit_code: code,
                        };
                    }
                    if code == Some(0) {
                        tracing::info!(target: "launch", "Game exited cleanly before it finished loading");
                        self.enter(Stage::Done).await;
                        self.emit_event(LaunchEvent::Loading(false)).await;
                        return LaunchOutcome::Completed {
                            loaded: false,
                            exit_code: code,
                        };
                    }
                    return self.fail(LaunchError::ExitedBeforeLoad { code }).await;
                }
            }
        }

        match failure {
            Some(outcome) => outcome,
            None => {
                self.fail(LaunchError::Unexpected {
                    message: "game supervisor stopped without an exit status".into(),
                })
                .await
            }
        }
    }

    async fn cancel(&mut self) -> LaunchOutcome {
        tracing::info!(target: "launch", "Launch cancelled at the Java prompt");
        self.enter(Stage::Done).await;
        self.details(messages::LAUNCH_CANCELLED).await;
        self.emit_event(LaunchEvent::Loading(false)).await;
        LaunchOutcome::Cancelled
    }

    async fn fail(&mut self, e: LaunchError) -> LaunchOutcome {
        tracing::error!(target: "launch", stage = %self.stage, error = %e, "Launch failed");
        let error = e.displayable();
        self.emit_event(LaunchEvent::Loading(false)).await;
        self.enter(Stage::Failed).await;
        self.emit_event(LaunchEvent::Failed(error.clone())).await;
        LaunchOutcome::Failed {
            kind: e.kind(),
            error,
        }
    }

    /// Move to `stage`, starting its percentage at 0.
    async fn enter(&mut self, stage: Stage) {
        tracing::debug!(target: "launch", from = %self.stage, to = %stage, "Stage transition");
        self.stage = stage;
        self.progress.reset();
        self.emit_event(LaunchEvent::StageChanged(stage)).await;
    }

    async fn details(&self, text: &str) {
        self.emit_event(LaunchEvent::Details(text.to_string())).await;
    }

    /// Emit an event to the event channel if configured.
    async fn emit_event(&self, event: LaunchEvent) {
        if let Some(ref tx) = self.event_tx {
            tx.send(event).await.ok();
        }
    }
}

fn acquisition(e: anyhow::Error) -> LaunchError {
    LaunchError::JavaAcquisition {
        message: format!("{e:#}"),
    }
}

/// Settings writes during a launch are best-effort.
fn persist(settings: &Settings) {
    if let Err(e) = settings.save() {
        tracing::warn!(target: "launch", error = %e, "Failed to save settings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, AccountKind};
    use crate::distribution::Distribution;
    use crate::distribution::JavaOptions;
    use crate::distribution::tests::SAMPLE;
    use crate::errors::{DistributionError, Displayable, FailureKind};
    use crate::java::{JdkAsset, JdkDownload};
    use crate::repair::RepairPlan;
    use crate::settings::MemoryStateStore;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn jvm(path: &str) -> JvmDetails {
        JvmDetails {
            executable: PathBuf::from(path),
            version: semver::Version::new(17, 0, 8),
        }
    }

    /// Java resolver whose valid executables grow when a JDK is extracted.
    struct FakeJava {
        valid: Mutex<Vec<PathBuf>>,
        discovered: Option<JvmDetails>,
        asset: Option<JdkAsset>,
        transferred: u64,
        checksum_ok: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeJava {
        fn installed() -> Self {
            Self {
                discovered: Some(jvm("/usr/bin/java")),
                ..Self::missing()
            }
        }

        fn missing() -> Self {
            Self {
                valid: Mutex::new(Vec::new()),
                discovered: None,
                asset: Some(JdkAsset {
                    url: "https://jdk.test/jdk.tar.gz".into(),
                    file_name: "jdk.tar.gz".into(),
                    size: 100,
                    sha256: "ff".into(),
                }),
                transferred: 100,
                checksum_ok: true,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JavaResolver for FakeJava {
        async fn validate(&self, executable: &Path, _options: &JavaOptions) -> Option<JvmDetails> {
            self.calls.lock().unwrap().push("validate");
            let valid = self.valid.lock().unwrap();
            valid
                .iter()
                .any(|p| p == executable)
                .then(|| jvm(&executable.to_string_lossy()))
        }

        async fn discover(&self, _options: &JavaOptions) -> Result<Option<JvmDetails>> {
            self.calls.lock().unwrap().push("discover");
            Ok(self.discovered.clone())
        }

        async fn latest_jdk(&self, _major: u32) -> Result<JdkAsset> {
            self.calls.lock().unwrap().push("latest_jdk");
            self.asset.clone().ok_or_else(|| anyhow!("no release"))
        }

        async fn download(&self, _asset: &JdkAsset, progress: &ProgressReporter) -> Result<JdkDownload> {
            self.calls.lock().unwrap().push("download");
            progress.bytes(self.transferred, 100);
            Ok(JdkDownload {
                archive: PathBuf::from("/rt/jdk.tar.gz"),
                transferred: self.transferred,
            })
        }

        async fn verify_checksum(&self, _archive: &Path, _asset: &JdkAsset) -> Result<bool> {
            self.calls.lock().unwrap().push("verify_checksum");
            Ok(self.checksum_ok)
        }

        async fn extract(&self, _archive: &Path, progress: &ProgressReporter) -> Result<PathBuf> {
            self.calls.lock().unwrap().push("extract");
            progress.set(100);
            let exe = PathBuf::from("/rt/jdk-17/bin/java");
            self.valid.lock().unwrap().push(exe.clone());
            Ok(exe)
        }
    }

    #[derive(Default)]
    struct FakeRepairer {
        invalid: usize,
        downloads: Mutex<usize>,
    }

    #[async_trait]
    impl IntegrityRepairer for FakeRepairer {
        async fn verify(&self, server: &ServerProfile, progress: &ProgressReporter) -> Result<RepairPlan> {
            progress.set(100);
            let artifact = server.artifacts.first().cloned();
            Ok(RepairPlan {
                invalid: artifact.into_iter().cycle().take(self.invalid).collect(),
            })
        }

        async fn download(&self, _plan: &RepairPlan, progress: &ProgressReporter) -> Result<()> {
            *self.downloads.lock().unwrap() += 1;
            progress.set(100);
            Ok(())
        }
    }

    /// Replays a fixed list of process events.
    struct FakeLauncher {
        events: Mutex<Option<Vec<GameEvent>>>,
        launched_as: Mutex<Option<String>>,
    }

    impl FakeLauncher {
        fn new(events: Vec<GameEvent>) -> Self {
            Self {
                events: Mutex::new(Some(events)),
                launched_as: Mutex::new(None),
            }
        }

        fn loads_then_exits() -> Self {
            Self::new(vec![
                GameEvent::LoadingComplete,
                GameEvent::Exited {
                    code: Some(0),
                    launch_completed: true,
                },
            ])
        }
    }

    #[async_trait]
    impl GameLauncher for FakeLauncher {
        async fn launch(&self, request: LaunchRequest<'_>) -> Result<GameProcess, LaunchError> {
            *self.launched_as.lock().unwrap() = Some(request.account.uuid.clone());
            let events = self.events.lock().unwrap().take().unwrap_or_default();
            let (tx, rx) = mpsc::channel(events.len().max(1));
            for event in events {
                tx.try_send(event).unwrap();
            }
            Ok(GameProcess::new(Some(42), rx))
        }
    }

    struct ScriptedPrompt {
        choices: Mutex<Vec<JavaChoice>>,
        manual: Mutex<Vec<ManualChoice>>,
    }

    impl ScriptedPrompt {
        fn new(choices: Vec<JavaChoice>, manual: Vec<ManualChoice>) -> Self {
            Self {
                choices: Mutex::new(choices),
                manual: Mutex::new(manual),
            }
        }
    }

    #[async_trait]
    impl JavaPrompt for ScriptedPrompt {
        async fn missing_java(&self, _major: u32) -> JavaChoice {
            self.choices.lock().unwrap().remove(0)
        }

        async fn confirm_manual(&self, _major: u32) -> ManualChoice {
            self.manual.lock().unwrap().remove(0)
        }
    }

    struct Unavailable;

    #[async_trait]
    impl DistributionSource for Unavailable {
        async fn load(&self) -> Result<Distribution, DistributionError> {
            Err(DistributionError::Unavailable)
        }
    }

    struct Harness {
        java: Arc<FakeJava>,
        repairer: Arc<FakeRepairer>,
        launcher: Arc<FakeLauncher>,
        prompt: Arc<ScriptedPrompt>,
        distribution: Arc<dyn DistributionSource>,
    }

    impl Harness {
        fn new(java: FakeJava) -> Self {
            Self {
                java: Arc::new(java),
                repairer: Arc::new(FakeRepairer::default()),
                launcher: Arc::new(FakeLauncher::loads_then_exits()),
                prompt: Arc::new(ScriptedPrompt::new(vec![], vec![])),
                distribution: Arc::new(Distribution::parse(SAMPLE).unwrap()),
            }
        }

        /// Run a launch, returning the outcome and every emitted event.
        async fn run(&self, settings: &mut Settings) -> (LaunchOutcome, Vec<LaunchEvent>) {
            let (tx, mut rx) = mpsc::channel(256);
            let mut orchestrator = LaunchOrchestrator::new(LaunchServices {
                distribution: self.distribution.clone(),
                java: self.java.clone(),
                repairer: self.repairer.clone(),
                launcher: self.launcher.clone(),
                prompt: self.prompt.clone(),
            })
            .with_event_channel(tx)
            .with_presence(false);

            let outcome = orchestrator.launch(settings).await;
            drop(orchestrator);
            let mut events = Vec::new();
            while let Some(event) = rx.recv().await {
                events.push(event);
            }
            (outcome, events)
        }
    }

    fn stages(events: &[LaunchEvent]) -> Vec<Stage> {
        events
            .iter()
            .filter_map(|e| match e {
                LaunchEvent::StageChanged(stage) => Some(*stage),
                _ => None,
            })
            .collect()
    }

    fn signed_in() -> (Settings, MemoryStateStore) {
        let store = MemoryStateStore::new();
        let mut settings = Settings::load(Box::new(store.clone())).unwrap();
        settings.accounts_mut().upsert(Account {
            id: None,
            uuid: "u1".into(),
            display_name: "Steve".into(),
            access_token: "t".into(),
            email: "s@example.com".into(),
            kind: AccountKind::Current,
        });
        (settings, store)
    }

    fn failure(outcome: &LaunchOutcome) -> (FailureKind, String, String) {
        match outcome {
            LaunchOutcome::Failed { kind, error } => (*kind, error.title.clone(), error.desc.clone()),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_happy_path_skips_downloading_when_files_valid() {
        let h = Harness::new(FakeJava::installed());
        let (mut settings, _) = signed_in();

        let (outcome, events) = h.run(&mut settings).await;

        assert_eq!(
            outcome,
            LaunchOutcome::Completed {
                loaded: true,
                exit_code: Some(0)
            }
        );
        assert_eq!(
            stages(&events),
            [
                Stage::JavaCheck,
                Stage::JavaOk,
                Stage::ValidatingFiles,
                Stage::Launching,
                Stage::Monitoring,
                Stage::Done
            ]
        );
        assert_eq!(*h.repairer.downloads.lock().unwrap(), 0);
        assert_eq!(h.launcher.launched_as.lock().unwrap().as_deref(), Some("u1"));
        assert_eq!(
            settings.java_executable("survival"),
            Some(Path::new("/usr/bin/java"))
        );
        assert!(events.contains(&LaunchEvent::Details(messages::DONE_ENJOY.into())));
    }

    #[tokio::test]
    async fn test_invalid_files_are_downloaded() {
        let mut h = Harness::new(FakeJava::installed());
        h.repairer = Arc::new(FakeRepairer {
            invalid: 2,
            ..Default::default()
        });
        let (mut settings, _) = signed_in();

        let (_, events) = h.run(&mut settings).await;
        let stages = stages(&events);
        let validating = stages.iter().position(|s| *s == Stage::ValidatingFiles).unwrap();
        assert_eq!(stages[validating + 1], Stage::DownloadingFiles);
        assert_eq!(stages[validating + 2], Stage::Launching);
        assert_eq!(*h.repairer.downloads.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_configured_java_is_validated_before_discovery() {
        let java = FakeJava::missing();
        java.valid.lock().unwrap().push(PathBuf::from("/opt/java"));
        let h = Harness::new(java);
        let (mut settings, _) = signed_in();
        settings.set_java_executable("survival", "/opt/java");

        let (outcome, _) = h.run(&mut settings).await;
        assert!(!outcome.is_failure());
        assert_eq!(h.java.calls(), ["validate"]);
    }

    #[tokio::test]
    async fn test_automatic_install_loops_back_to_check() {
        let mut h = Harness::new(FakeJava::missing());
        h.prompt = Arc::new(ScriptedPrompt::new(
            vec![JavaChoice::InstallAutomatically],
            vec![],
        ));
        let (mut settings, store) = signed_in();

        let (outcome, events) = h.run(&mut settings).await;

        assert!(!outcome.is_failure(), "{outcome:?}");
        assert_eq!(
            &stages(&events)[..6],
            [
                Stage::JavaCheck,
                Stage::JavaMissing,
                Stage::JavaDownloading,
                Stage::JavaExtracting,
                Stage::JavaCheck,
                Stage::JavaOk
            ]
        );
        assert_eq!(
            settings.java_executable("survival"),
            Some(Path::new("/rt/jdk-17/bin/java"))
        );
        assert!(store.save_count() >= 1);
        assert!(!h.java.calls().contains(&"verify_checksum"));
    }

    #[tokio::test]
    async fn test_size_mismatch_with_bad_checksum_fails() {
        let mut java = FakeJava::missing();
        java.transferred = 90;
        java.checksum_ok = false;
        let mut h = Harness::new(java);
        h.prompt = Arc::new(ScriptedPrompt::new(
            vec![JavaChoice::InstallAutomatically],
            vec![],
        ));
        let (mut settings, _) = signed_in();

        let (outcome, events) = h.run(&mut settings).await;

        let (kind, title, desc) = failure(&outcome);
        assert_eq!(kind, FailureKind::IntegrityFailure);
        assert_eq!(title, messages::JAVA_DOWNLOAD_FAILURE_TITLE);
        assert_eq!(desc, messages::JAVA_DOWNLOAD_CORRUPTED);
        assert!(!h.java.calls().contains(&"extract"));

        // loading is released before the failure is shown
        let released = events
            .iter()
            .rposition(|e| *e == LaunchEvent::Loading(false))
            .unwrap();
        let failed = events
            .iter()
            .position(|e| matches!(e, LaunchEvent::Failed(_)))
            .unwrap();
        assert!(released < failed);
        assert_eq!(stages(&events).last(), Some(&Stage::Failed));
    }

    #[tokio::test]
    async fn test_size_mismatch_with_good_checksum_is_tolerated() {
        let mut java = FakeJava::missing();
        java.transferred = 90;
        let mut h = Harness::new(java);
        h.prompt = Arc::new(ScriptedPrompt::new(
            vec![JavaChoice::InstallAutomatically],
            vec![],
        ));
        let (mut settings, _) = signed_in();

        let (outcome, _) = h.run(&mut settings).await;
        assert!(!outcome.is_failure());
        assert!(h.java.calls().contains(&"verify_checksum"));
        assert!(h.java.calls().contains(&"extract"));
    }

    #[tokio::test]
    async fn test_missing_jdk_release_is_acquisition_failure() {
        let mut java = FakeJava::missing();
        java.asset = None;
        let mut h = Harness::new(java);
        h.prompt = Arc::new(ScriptedPrompt::new(
            vec![JavaChoice::InstallAutomatically],
            vec![],
        ));
        let (mut settings, _) = signed_in();

        let (outcome, _) = h.run(&mut settings).await;
        let (kind, _, desc) = failure(&outcome);
        assert_eq!(kind, FailureKind::JavaAcquisitionFailure);
        assert_eq!(desc, messages::FIND_JDK_FAILURE);
    }

    #[tokio::test]
    async fn test_manual_acknowledge_halts() {
        let mut h = Harness::new(FakeJava::missing());
        h.prompt = Arc::new(ScriptedPrompt::new(
            vec![JavaChoice::InstallManually],
            vec![ManualChoice::Acknowledge],
        ));
        let (mut settings, _) = signed_in();

        let (outcome, events) = h.run(&mut settings).await;
        assert_eq!(outcome, LaunchOutcome::Cancelled);
        assert_eq!(stages(&events).last(), Some(&Stage::Done));
        assert!(h.launcher.launched_as.lock().unwrap().is_none());
        assert!(!events.iter().any(|e| matches!(e, LaunchEvent::Failed(_))));
    }

    #[tokio::test]
    async fn test_manual_go_back_restarts_check() {
        let mut h = Harness::new(FakeJava::missing());
        h.prompt = Arc::new(ScriptedPrompt::new(
            vec![JavaChoice::InstallManually, JavaChoice::InstallAutomatically],
            vec![ManualChoice::GoBack],
        ));
        let (mut settings, _) = signed_in();

        let (outcome, events) = h.run(&mut settings).await;
        assert!(!outcome.is_failure());
        assert_eq!(
            &stages(&events)[..4],
            [
                Stage::JavaCheck,
                Stage::JavaMissing,
                Stage::JavaCheck,
                Stage::JavaMissing
            ]
        );
    }

    #[tokio::test]
    async fn test_no_selected_account_fails_at_launching() {
        let h = Harness::new(FakeJava::installed());
        let mut settings = Settings::in_memory();

        let (outcome, events) = h.run(&mut settings).await;
        let (_, title, desc) = failure(&outcome);
        assert_eq!(title, messages::LAUNCH_FAILURE_TITLE);
        assert_eq!(desc, messages::NO_ACCOUNT_SELECTED);
        assert!(stages(&events).contains(&Stage::Launching));
    }

    #[tokio::test]
    async fn test_legacy_account_is_refused_at_launching() {
        let h = Harness::new(FakeJava::installed());
        let (mut settings, _) = signed_in();
        settings.accounts_mut().upsert(Account {
            id: None,
            uuid: "old".into(),
            display_name: "Notch".into(),
            access_token: String::new(),
            email: "notch@example.com".into(),
            kind: AccountKind::Legacy,
        });

        let (outcome, events) = h.run(&mut settings).await;
        let (kind, title, desc) = failure(&outcome);
        assert_eq!(kind, FailureKind::AuthRejected);
        assert_eq!(title, messages::LAUNCH_FAILURE_TITLE);
        assert_eq!(desc, messages::LEGACY_ACCOUNT);
        assert!(stages(&events).contains(&Stage::Launching));
        assert!(!stages(&events).contains(&Stage::Monitoring));
    }

    #[tokio::test]
    async fn test_failure_releases_loading_then_reports() {
        let mut h = Harness::new(FakeJava::installed());
        h.distribution = Arc::new(Unavailable);
        let (mut settings, _) = signed_in();

        let (outcome, events) = h.run(&mut settings).await;
        let (_, title, desc) = failure(&outcome);
        assert_eq!(
            events[events.len() - 3..],
            [
                LaunchEvent::Loading(false),
                LaunchEvent::StageChanged(Stage::Failed),
                LaunchEvent::Failed(Displayable::new(title, desc)),
            ]
        );
    }

    #[tokio::test]
    async fn test_fatal_output_fails_and_drains_until_exit() {
        let mut h = Harness::new(FakeJava::installed());
        h.launcher = Arc::new(FakeLauncher::new(vec![
            GameEvent::Fatal(LaunchError::LaunchWrapperMissing),
            GameEvent::Exited {
                code: Some(1),
                launch_completed: false,
            },
        ]));
        let (mut settings, _) = signed_in();

        let (outcome, events) = h.run(&mut settings).await;
        let (_, _, desc) = failure(&outcome);
        assert_eq!(desc, messages::LAUNCH_WRAPPER_NOT_DOWNLOADED);
        let failures = events
            .iter()
            .filter(|e| matches!(e, LaunchEvent::Failed(_)))
            .count();
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn test_exit_before_load() {
        let mut h = Harness::new(FakeJava::installed());
        h.launcher = Arc::new(FakeLauncher::new(vec![GameEvent::Exited {
            code: Some(1),
            launch_completed: false,
        }]));
        let (mut settings, _) = signed_in();
        let (outcome, _) = h.run(&mut settings).await;
        assert_eq!(failure(&outcome).0, FailureKind::ProcessLaunchFailure);

        h.launcher = Arc::new(FakeLauncher::new(vec![GameEvent::Exited {
            code: Some(0),
            launch_completed: false,
        }]));
        let (outcome, _) = h.run(&mut settings).await;
        assert_eq!(
            outcome,
            LaunchOutcome::Completed {
                loaded: false,
                exit_code: Some(0)
            }
        );
    }

    #[tokio::test]
    async fn test_unavailable_distribution_is_fatal() {
        let mut h = Harness::new(FakeJava::installed());
        h.distribution = Arc::new(Unavailable);
        let (mut settings, _) = signed_in();

        let (outcome, events) = h.run(&mut settings).await;
        let (_, title, _) = failure(&outcome);
        assert_eq!(title, messages::FATAL_ERROR_TITLE);
        assert!(h.java.calls().is_empty());
        assert_eq!(events.first(), Some(&LaunchEvent::Loading(true)));
    }

    #[tokio::test]
    async fn test_selected_server_from_settings() {
        let h = Harness::new(FakeJava::installed());
        let (mut settings, _) = signed_in();
        settings.set_selected_server(Some("lobby".into()));

        let (outcome, _) = h.run(&mut settings).await;
        assert!(!outcome.is_failure());
        assert!(settings.java_executable("lobby").is_some());
        assert!(settings.java_executable("survival").is_none());
    }
}
