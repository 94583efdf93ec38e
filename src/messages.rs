//! User-facing strings for the launch area, overlays and login form.

// Launch area details
pub const PLEASE_WAIT: &str = "Please wait..";
pub const LOADING_SERVER_INFO: &str = "Loading server information..";
pub const CHECKING_SYSTEM: &str = "Checking system info..";
pub const JAVA_DOWNLOAD_PREPARE: &str = "Preparing Java download..";
pub const DOWNLOADING_JAVA: &str = "Downloading Java..";
pub const EXTRACTING_JAVA: &str = "Extracting Java";
pub const JAVA_INSTALLED: &str = "Java installed!";
pub const VALIDATING_FILES: &str = "Validating file integrity..";
pub const DOWNLOADING_FILES: &str = "Downloading files..";
pub const PREPARING_TO_LAUNCH: &str = "Preparing to launch..";
pub const LAUNCHING_GAME: &str = "Launching game..";
pub const DONE_ENJOY: &str = "Done. Enjoy the server!";

// Java prompts
pub const NO_COMPATIBLE_JAVA_TITLE: &str = "No Compatible Java Installation Found";
pub const INSTALL_JAVA: &str = "Install Java";
pub const INSTALL_JAVA_MANUALLY: &str = "Install Manually";
pub const JAVA_REQUIRED_TITLE: &str = "Java is Required to Launch";
pub const JAVA_REQUIRED_ACKNOWLEDGE: &str = "I Understand";
pub const JAVA_REQUIRED_GO_BACK: &str = "Go Back";

pub fn install_java_message(major: u32) -> String {
    format!(
        "In order to launch the game, you need a 64-bit installation of Java {major}. Would you like us to install a copy?"
    )
}

pub fn java_required_message(major: u32) -> String {
    format!(
        "A valid x64 installation of Java {major} is required to launch. Install it manually and point the launcher at it, or go back and let the launcher install it."
    )
}

// Failure overlays
pub const LAUNCH_FAILURE_TITLE: &str = "Error During Launch";
pub const FATAL_ERROR_TITLE: &str = "Fatal Error";
pub const JAVA_DOWNLOAD_FAILURE_TITLE: &str = "Error During Java Download";
pub const FILE_VERIFICATION_FAILURE_TITLE: &str = "Error During File Verification";
pub const FILE_DOWNLOAD_FAILURE_TITLE: &str = "Error During File Download";
pub const SEE_LOG_FOR_DETAILS: &str = "See the launcher log for more details.";
pub const CHECK_LOG_FOR_DETAILS: &str = "Please check the launcher log for more details.";
pub const UNABLE_TO_LOAD_DISTRIBUTION: &str =
    "Could not load a copy of the distribution index. See the launcher log for more details.";
pub const FIND_JDK_FAILURE: &str = "Failed to find an OpenJDK distribution.";
pub const JAVA_DOWNLOAD_CORRUPTED: &str =
    "Downloaded JDK has a bad hash, the file may be corrupted.";
pub const NO_ACCOUNT_SELECTED: &str = "You must be logged into an account.";
pub const LEGACY_ACCOUNT: &str =
    "This account type can no longer be used to play. Log in again with a current account.";
pub const LAUNCH_CANCELLED: &str = "Launch cancelled. Install Java to play.";
pub const LAUNCH_WRAPPER_NOT_DOWNLOADED: &str = "The main file, LaunchWrapper, failed to download properly. As a result, the game cannot launch. Temporarily turn off your antivirus software and launch the game again.";

// Presence
pub const PRESENCE_LOADING: &str = "Loading game..";
pub const PRESENCE_JOINING: &str = "Joining the server..";
pub const PRESENCE_JOINED: &str = "Playing on the server";

// Login
pub const LOGIN_UNKNOWN_ERROR: &str = "Unknown Error";
pub const LOGIN_TWO_FACTOR_TITLE: &str = "Two-Factor Authentication";
pub const LOGIN_TWO_FACTOR_DESC: &str = "Enter the code from your authenticator app.";
