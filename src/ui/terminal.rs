use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::errors::Displayable;
use crate::launch::{LaunchEvent, Stage};
use crate::ui::icons::{CHECK, CROSS};

const TICK: Duration = Duration::from_millis(100);

/// Terminal rendering of the launch area: a spinner while loading, a
/// percentage bar for stages that report one, and a failure block.
pub struct TerminalUi {
    bar: ProgressBar,
    verbose: bool,
    details: String,
    stage: Stage,
}

impl TerminalUi {
    pub fn new(verbose: bool) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(spinner_style());
        Self {
            bar,
            verbose,
            details: String::new(),
            stage: Stage::Idle,
        }
    }

    /// Handle to the bar, for suspending it around prompts.
    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }

    /// Render events and progress until the event channel closes.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<LaunchEvent>,
        mut progress: watch::Receiver<u8>,
    ) {
        let mut progress_open = true;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(&event),
                    None => break,
                },
                changed = progress.changed(), if progress_open => match changed {
                    Ok(()) => {
                        let pct = *progress.borrow_and_update();
                        self.bar.set_position(u64::from(pct));
                    }
                    Err(_) => progress_open = false,
                },
            }
        }
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    pub fn handle(&mut self, event: &LaunchEvent) {
        match event {
            LaunchEvent::Loading(true) => {
                self.bar.reset();
                self.bar.enable_steady_tick(TICK);
            }
            LaunchEvent::Loading(false) => {
                self.bar.disable_steady_tick();
                self.bar.finish_and_clear();
                // a failing launch releases the bar before its failure block
                if let Some(line) = self.release_line() {
                    println!("{}{}", CHECK, style(line).green());
                }
            }
            LaunchEvent::StageChanged(stage) => self.enter(*stage),
            LaunchEvent::Details(text) => {
                self.details.clone_from(text);
                self.bar.set_message(text.clone());
                if self.verbose {
                    self.bar
                        .println(format!("  {} {}", style("→").dim(), style(text).dim()));
                }
            }
            LaunchEvent::Failed(error) => print_failure(error),
        }
    }

    /// Details line confirming a release, shown only once the launch is done.
    fn release_line(&self) -> Option<&str> {
        (self.stage == Stage::Done && !self.details.is_empty()).then_some(self.details.as_str())
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        if stage == Stage::Failed {
            // the failure block replaces the last details line
            self.details.clear();
            return;
        }
        self.bar.set_position(0);
        if stage.reports_progress() {
            self.bar.set_style(percent_style());
        } else {
            self.bar.set_style(spinner_style());
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .expect("progress bar template is a valid static string")
}

fn percent_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos:>3}%")
        .expect("progress bar template is a valid static string")
        .progress_chars("█▓▒░")
}

/// Styled title/description block for a failure.
pub fn print_failure(error: &Displayable) {
    eprintln!();
    eprintln!("{}{}", CROSS, style(&error.title).red().bold());
    eprintln!("   {}", error.desc);
    eprintln!();
}
