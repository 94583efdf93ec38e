use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use super::command::GameCommand;
use super::markers::{MIN_LINGER, Marker, OutputMonitor, OutputStream, linger_delay};
use crate::errors::LaunchError;
use crate::messages;
use crate::presence::PresenceProvider;

/// Lifecycle notifications from a supervised game process.
#[derive(Debug)]
pub enum GameEvent {
    /// The game finished loading and the minimum linger has elapsed.
    LoadingComplete,
    /// A known fatal failure was detected in the output.
    Fatal(LaunchError),
    /// The process exited and its output has been drained.
    Exited {
        code: Option<i32>,
        launch_completed: bool,
    },
}

/// Handle to a running game process.
pub struct GameProcess {
    pid: Option<u32>,
    events: mpsc::Receiver<GameEvent>,
}

impl GameProcess {
    pub fn new(pid: Option<u32>, events: mpsc::Receiver<GameEvent>) -> Self {
        Self { pid, events }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub async fn next_event(&mut self) -> Option<GameEvent> {
        self.events.recv().await
    }

    /// Consume remaining events until the process exits. Returns the exit code.
    pub async fn wait(mut self) -> Option<i32> {
        while let Some(event) = self.events.recv().await {
            if let GameEvent::Exited { code, .. } = event {
                return code;
            }
        }
        None
    }
}

/// Launches game processes and scrapes their output for lifecycle markers.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    min_linger: Duration,
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self {
            min_linger: MIN_LINGER,
        }
    }

    pub fn with_min_linger(mut self, min_linger: Duration) -> Self {
        self.min_linger = min_linger;
        self
    }

    /// Start `command` and supervise it in a background task.
    pub fn spawn(
        &self,
        command: &GameCommand,
        display_name: &str,
        presence: Option<Arc<dyn PresenceProvider>>,
    ) -> Result<GameProcess, LaunchError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LaunchError::ProcessLaunch {
                message: format!("{}: {e}", command.program.display()),
            })?;
        let started = Instant::now();
        let pid = child.id();
        tracing::info!(target: "launch", pid, "Game process started");

        let (line_tx, line_rx) = mpsc::channel(256);
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, OutputStream::Stdout, line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, OutputStream::Stderr, line_tx));
        }

        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    tracing::warn!(target: "launch", error = %e, "Failed to wait on game process");
                    None
                }
            };
            exit_tx.send(code).ok();
        });

        let (event_tx, event_rx) = mpsc::channel(32);
        let session = Supervision {
            monitor: OutputMonitor::new(display_name),
            presence,
            events: event_tx,
            min_linger: self.min_linger,
            started,
        };
        tokio::spawn(session.run(line_rx, exit_rx));

        Ok(GameProcess::new(pid, event_rx))
    }
}

async fn forward_lines<R>(reader: R, stream: OutputStream, tx: mpsc::Sender<(OutputStream, String)>)
where
    R: AsyncRead + Unpin,
{
    let mut segments = BufReader::new(reader).split(b'\n');
    loop {
        match segments.next_segment().await {
            Ok(Some(bytes)) => {
                let line = String::from_utf8_lossy(&bytes).into_owned();
                if tx.send((stream, line)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(target: "game", error = %e, "Output stream closed");
                break;
            }
        }
    }
}

/// State owned by the supervisor task for one process.
pub(crate) struct Supervision {
    pub(crate) monitor: OutputMonitor,
    pub(crate) presence: Option<Arc<dyn PresenceProvider>>,
    pub(crate) events: mpsc::Sender<GameEvent>,
    pub(crate) min_linger: Duration,
    pub(crate) started: Instant,
}

impl Supervision {
    /// Process output until the exit code arrives, both streams close and any
    /// scheduled release has fired.
    pub(crate) async fn run(
        mut self,
        mut lines: mpsc::Receiver<(OutputStream, String)>,
        mut exit_rx: oneshot::Receiver<Option<i32>>,
    ) {
        if let Some(presence) = &self.presence {
            presence.update_details(messages::PRESENCE_LOADING);
        }

        let mut release_at: Option<Instant> = None;
        let mut released = false;
        let mut lines_open = true;
        let mut exit: Option<Option<i32>> = None;
        // Stand-in deadline while no release is scheduled; that branch is disabled then.
        let never = self.started + Duration::from_secs(60 * 60 * 24 * 365);

        // A pending release still honours the linger after the process exits.
        while lines_open || exit.is_none() || (release_at.is_some() && !released) {
            tokio::select! {
                line = lines.recv(), if lines_open => match line {
                    Some((stream, line)) => {
                        if let Some(at) = self.handle_line(stream, &line).await {
                            release_at = Some(at);
                        }
                    }
                    None => lines_open = false,
                },
                _ = tokio::time::sleep_until(release_at.unwrap_or(never)), if release_at.is_some() && !released => {
                    released = true;
                    self.release().await;
                }
                code = &mut exit_rx, if exit.is_none() => {
                    exit = Some(code.unwrap_or(None));
                }
            }
        }

        let launch_completed = released;

        self.monitor.detach_launch_listeners();
        self.monitor.detach_presence_listeners();
        if let Some(presence) = &self.presence {
            presence.shutdown();
        }

        let code = exit.flatten();
        tracing::info!(target: "launch", ?code, launch_completed, "Game process exited");
        self.events
            .send(GameEvent::Exited {
                code,
                launch_completed,
            })
            .await
            .ok();
    }

    /// Returns the release deadline when the launch marker fires.
    async fn handle_line(&mut self, stream: OutputStream, line: &str) -> Option<Instant> {
        tracing::debug!(target: "game", ?stream, "{line}");

        match self.monitor.observe(stream, line)? {
            Marker::LaunchComplete => {
                let delay = linger_delay(self.started.elapsed(), self.min_linger);
                tracing::info!(target: "launch", delay_ms = delay.as_millis() as u64, "Launch marker seen");
                return Some(Instant::now() + delay);
            }
            Marker::LaunchWrapperMissing => {
                tracing::error!(target: "launch", "Game could not find the LaunchWrapper main class");
                self.events
                    .send(GameEvent::Fatal(LaunchError::LaunchWrapperMissing))
                    .await
                    .ok();
            }
            Marker::SoundEngineStarted => {
                if let Some(presence) = &self.presence {
                    presence.update_details(messages::PRESENCE_JOINING);
                }
            }
            Marker::PlayerJoined => {
                if let Some(presence) = &self.presence {
                    presence.update_details(messages::PRESENCE_JOINED);
                }
            }
        }
        None
    }

    async fn release(&mut self) {
        if self.presence.is_some() {
            self.monitor.attach_presence_listeners();
        }
        self.events.send(GameEvent::LoadingComplete).await.ok();
    }
}
