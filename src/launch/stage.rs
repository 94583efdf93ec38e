use serde::Serialize;
use std::fmt;

use crate::errors::{Displayable, FailureKind};

/// Launch sequence states.
///
/// ```text
/// Idle -> JavaCheck -> (JavaMissing -> JavaDownloading -> JavaExtracting -> JavaCheck)*
///      -> JavaOk -> ValidatingFiles -> (DownloadingFiles)? -> Launching -> Monitoring
///      -> Done | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    JavaCheck,
    JavaMissing,
    JavaDownloading,
    JavaExtracting,
    JavaOk,
    ValidatingFiles,
    DownloadingFiles,
    Launching,
    Monitoring,
    Done,
    Failed,
}

impl Stage {
    /// Stages that publish a percentage.
    pub fn reports_progress(self) -> bool {
        matches!(
            self,
            Stage::JavaDownloading
                | Stage::JavaExtracting
                | Stage::ValidatingFiles
                | Stage::DownloadingFiles
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::JavaCheck => "java_check",
            Stage::JavaMissing => "java_missing",
            Stage::JavaDownloading => "java_downloading",
            Stage::JavaExtracting => "java_extracting",
            Stage::JavaOk => "java_ok",
            Stage::ValidatingFiles => "validating_files",
            Stage::DownloadingFiles => "downloading_files",
            Stage::Launching => "launching",
            Stage::Monitoring => "monitoring",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a launch attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The game process ran and has exited. `loaded` is false when it exited
    /// cleanly before signalling that loading finished.
    Completed {
        loaded: bool,
        exit_code: Option<i32>,
    },
    /// The user declined to install Java.
    Cancelled,
    Failed {
        kind: FailureKind,
        error: Displayable,
    },
}

impl LaunchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, LaunchOutcome::Failed { .. })
    }

    /// Taxonomy entry for launches that did not run to completion.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            LaunchOutcome::Completed { .. } => None,
            LaunchOutcome::Cancelled => Some(FailureKind::UserCancelled),
            LaunchOutcome::Failed { kind, .. } => Some(*kind),
        }
    }
}
