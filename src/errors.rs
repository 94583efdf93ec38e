//! Typed error hierarchy for Lodestone.
//!
//! Top-level enums per subsystem:
//! - `AuthError`: authentication against the auth provider and account removal
//! - `LaunchError`: failures of a launch-sequence stage
//! - `StoreError`: settings persistence
//! - `DistributionError`: distribution index loading
//! - `NewsError`: news feed fetch and parse
//!
//! Every failure that reaches the user carries a [`Displayable`] pair.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::messages;

/// A title/description pair suitable for an error overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Displayable {
    pub title: String,
    pub desc: String,
}

impl Displayable {
    pub fn new(title: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            desc: desc.into(),
        }
    }
}

impl std::fmt::Display for Displayable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.desc)
    }
}

/// Failure taxonomy shared by the auth and launch subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    TransportFailure,
    AuthRejected,
    /// Not a failure: the caller must re-prompt for a second factor.
    RequiresTwoFactor,
    IntegrityFailure,
    JavaAcquisitionFailure,
    ProcessLaunchFailure,
    /// Non-error terminal path chosen by the user.
    UserCancelled,
}

/// Errors from the auth gateway.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Two-factor code required")]
    RequiresTwoFactor,

    #[error("Authentication rejected: {raw}")]
    Rejected { raw: String },

    #[error("Auth provider unreachable: {message}")]
    Transport { message: String },

    #[error("Account {uuid} not found")]
    UnknownAccount { uuid: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AuthError::RequiresTwoFactor => FailureKind::RequiresTwoFactor,
            AuthError::Rejected { .. } | AuthError::UnknownAccount { .. } => {
                FailureKind::AuthRejected
            }
            AuthError::Transport { .. } | AuthError::Store(_) => FailureKind::TransportFailure,
        }
    }

    /// Title/description for the login form. The raw provider response is the
    /// description, as the backend's own message is the most useful thing to show.
    pub fn displayable(&self) -> Displayable {
        match self {
            AuthError::RequiresTwoFactor => Displayable::new(
                messages::LOGIN_TWO_FACTOR_TITLE,
                messages::LOGIN_TWO_FACTOR_DESC,
            ),
            AuthError::Rejected { raw } => Displayable::new(messages::LOGIN_UNKNOWN_ERROR, raw),
            AuthError::Transport { message } => {
                Displayable::new(messages::LOGIN_UNKNOWN_ERROR, message)
            }
            AuthError::UnknownAccount { uuid } => Displayable::new(
                messages::LOGIN_UNKNOWN_ERROR,
                format!("No stored account with id {uuid}"),
            ),
            AuthError::Store(e) => Displayable::new(messages::LOGIN_UNKNOWN_ERROR, e.to_string()),
        }
    }
}

/// Errors from a single launch stage.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Distribution index unavailable: {0}")]
    Distribution(#[from] DistributionError),

    #[error("Java acquisition failed: {message}")]
    JavaAcquisition { message: String },

    #[error("Downloaded JDK {path} failed checksum validation")]
    JavaChecksumMismatch { path: PathBuf },

    #[error("File verification failed: {message}")]
    FileVerification { message: String },

    #[error("File download failed: {message}")]
    FileDownload { message: String },

    #[error("No account selected")]
    NoAccountSelected,

    #[error("Account {uuid} is a legacy account and cannot be used to play")]
    LegacyAccount { uuid: String },

    #[error("Failed to start game process: {message}")]
    ProcessLaunch { message: String },

    #[error("LaunchWrapper main class missing from the game classpath")]
    LaunchWrapperMissing,

    #[error("Game exited with code {code:?} before it finished loading")]
    ExitedBeforeLoad { code: Option<i32> },

    #[error("Unexpected launch error: {message}")]
    Unexpected { message: String },
}

impl LaunchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LaunchError::Distribution(_) => FailureKind::TransportFailure,
            LaunchError::JavaAcquisition { .. } => FailureKind::JavaAcquisitionFailure,
            LaunchError::JavaChecksumMismatch { .. }
            | LaunchError::FileVerification { .. }
            | LaunchError::FileDownload { .. } => FailureKind::IntegrityFailure,
            LaunchError::LegacyAccount { .. } => FailureKind::AuthRejected,
            LaunchError::NoAccountSelected
            | LaunchError::ProcessLaunch { .. }
            | LaunchError::LaunchWrapperMissing
            | LaunchError::ExitedBeforeLoad { .. }
            | LaunchError::Unexpected { .. } => FailureKind::ProcessLaunchFailure,
        }
    }

    pub fn displayable(&self) -> Displayable {
        use messages::*;
        match self {
            LaunchError::Distribution(_) => {
                Displayable::new(FATAL_ERROR_TITLE, UNABLE_TO_LOAD_DISTRIBUTION)
            }
            LaunchError::JavaAcquisition { message } => {
                Displayable::new(JAVA_DOWNLOAD_FAILURE_TITLE, message.clone())
            }
            LaunchError::JavaChecksumMismatch { .. } => {
                Displayable::new(JAVA_DOWNLOAD_FAILURE_TITLE, JAVA_DOWNLOAD_CORRUPTED)
            }
            LaunchError::FileVerification { message } => {
                Displayable::new(FILE_VERIFICATION_FAILURE_TITLE, or_see_log(message))
            }
            LaunchError::FileDownload { message } => {
                Displayable::new(FILE_DOWNLOAD_FAILURE_TITLE, or_see_log(message))
            }
            LaunchError::NoAccountSelected => {
                Displayable::new(LAUNCH_FAILURE_TITLE, NO_ACCOUNT_SELECTED)
            }
            LaunchError::LegacyAccount { .. } => {
                Displayable::new(LAUNCH_FAILURE_TITLE, LEGACY_ACCOUNT)
            }
            LaunchError::ProcessLaunch { .. } => {
                Displayable::new(LAUNCH_FAILURE_TITLE, CHECK_LOG_FOR_DETAILS)
            }
            LaunchError::LaunchWrapperMissing => {
                Displayable::new(LAUNCH_FAILURE_TITLE, LAUNCH_WRAPPER_NOT_DOWNLOADED)
            }
            LaunchError::ExitedBeforeLoad { code } => Displayable::new(
                LAUNCH_FAILURE_TITLE,
                match code {
                    Some(code) => format!("The game exited with code {code} before it finished loading. {SEE_LOG_FOR_DETAILS}"),
                    None => format!("The game was terminated before it finished loading. {SEE_LOG_FOR_DETAILS}"),
                },
            ),
            LaunchError::Unexpected { .. } => {
                Displayable::new(LAUNCH_FAILURE_TITLE, SEE_LOG_FOR_DETAILS)
            }
        }
    }
}

fn or_see_log(message: &str) -> String {
    if message.trim().is_empty() {
        messages::SEE_LOG_FOR_DETAILS.to_string()
    } else {
        message.to_string()
    }
}

/// Errors from the settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access settings file at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file at {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Settings file at {path} is locked by another process")]
    Locked { path: PathBuf },
}

/// Errors from loading the distribution index.
#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("Failed to fetch distribution from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read distribution at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Distribution document is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No distribution source configured and no cached copy available")]
    Unavailable,

    #[error("Server {id} is not part of the distribution")]
    UnknownServer { id: String },

    #[error("Distribution lists no servers")]
    NoServers,
}

/// Errors from the news feed.
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("Failed to fetch news feed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("News feed is not valid XML: {0}")]
    Xml(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_two_factor_is_not_a_rejection() {
        let err = AuthError::RequiresTwoFactor;
        assert_eq!(err.kind(), FailureKind::RequiresTwoFactor);
        assert!(!matches!(err, AuthError::Rejected { .. }));
    }

    #[test]
    fn rejected_displayable_carries_raw_response() {
        let err = AuthError::Rejected {
            raw: r#"{"status":"error","reason":"invalid_credentials"}"#.to_string(),
        };
        let d = err.displayable();
        assert_eq!(d.title, messages::LOGIN_UNKNOWN_ERROR);
        assert!(d.desc.contains("invalid_credentials"));
    }

    #[test]
    fn launch_error_kinds_follow_taxonomy() {
        assert_eq!(
            LaunchError::JavaChecksumMismatch {
                path: PathBuf::from("/tmp/jdk.tar.gz")
            }
            .kind(),
            FailureKind::IntegrityFailure
        );
        assert_eq!(
            LaunchError::JavaAcquisition {
                message: "no asset".into()
            }
            .kind(),
            FailureKind::JavaAcquisitionFailure
        );
        assert_eq!(
            LaunchError::LaunchWrapperMissing.kind(),
            FailureKind::ProcessLaunchFailure
        );
        assert_eq!(
            LaunchError::LegacyAccount { uuid: "u1".into() }.kind(),
            FailureKind::AuthRejected
        );
    }

    #[test]
    fn empty_verification_message_falls_back_to_log_hint() {
        let d = LaunchError::FileVerification {
            message: "  ".into(),
        }
        .displayable();
        assert_eq!(d.title, messages::FILE_VERIFICATION_FAILURE_TITLE);
        assert_eq!(d.desc, messages::SEE_LOG_FOR_DETAILS);
    }

    #[test]
    fn exited_before_load_mentions_exit_code() {
        let d = LaunchError::ExitedBeforeLoad { code: Some(137) }.displayable();
        assert!(d.desc.contains("137"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&AuthError::RequiresTwoFactor);
        assert_std_error(&LaunchError::NoAccountSelected);
        assert_std_error(&StoreError::Locked {
            path: PathBuf::from("settings.json"),
        });
        assert_std_error(&DistributionError::NoServers);
        assert_std_error(&NewsError::Xml("eof".into()));
    }
}
