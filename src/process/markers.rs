//! Game output markers and the per-process listener state.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// Minimum time the loading UI stays up after the process starts.
pub const MIN_LINGER: Duration = Duration::from_millis(5000);

/// Printed on stderr when the LaunchWrapper jar is missing or corrupt.
pub const LAUNCH_WRAPPER_NOT_FOUND: &str =
    "Could not find or load main class net.minecraft.launchwrapper.Launch";

static LAUNCH_COMPLETE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[.+\]: (?:MinecraftForge .+ Initialized|ModLauncher .+ starting: .+|Loading Minecraft .+ with Fabric Loader .+)$",
    )
    .unwrap()
});

static SOUND_ENGINE_STARTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.+\]: Sound engine started").unwrap());

/// Matches the chat broadcast announcing that `display_name` joined. The name
/// is matched literally.
pub fn joined_pattern(display_name: &str) -> Regex {
    Regex::new(&format!(
        r"\[.+\]: \[CHAT\] {} joined the game",
        regex::escape(display_name)
    ))
    .unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    LaunchComplete,
    SoundEngineStarted,
    PlayerJoined,
    LaunchWrapperMissing,
}

/// Time still to wait before releasing the loading UI, given how long the
/// process has been running when the launch marker appeared.
pub fn linger_delay(elapsed: Duration, min_linger: Duration) -> Duration {
    min_linger.saturating_sub(elapsed)
}

/// Which listeners are attached to a game process's output.
///
/// The launch and fatal listeners are attached from the start and detach
/// together when the launch marker fires. The presence listeners are attached
/// once the loading UI has been released.
#[derive(Debug)]
pub struct OutputMonitor {
    joined: Regex,
    launch_listeners: bool,
    presence_listeners: bool,
}

impl OutputMonitor {
    pub fn new(display_name: &str) -> Self {
        Self {
            joined: joined_pattern(display_name),
            launch_listeners: true,
            presence_listeners: false,
        }
    }

    /// Classify one output line against the attached listeners.
    pub fn observe(&mut self, stream: OutputStream, line: &str) -> Option<Marker> {
        let line = line.trim_end_matches(['\r', '\n']);

        if self.launch_listeners {
            match stream {
                OutputStream::Stdout if LAUNCH_COMPLETE.is_match(line) => {
                    self.detach_launch_listeners();
                    return Some(Marker::LaunchComplete);
                }
                OutputStream::Stderr if line.contains(LAUNCH_WRAPPER_NOT_FOUND) => {
                    self.detach_launch_listeners();
                    return Some(Marker::LaunchWrapperMissing);
                }
                _ => {}
            }
        }

        if self.presence_listeners && stream == OutputStream::Stdout {
            if SOUND_ENGINE_STARTED.is_match(line) {
                return Some(Marker::SoundEngineStarted);
            }
            if self.joined.is_match(line) {
                return Some(Marker::PlayerJoined);
            }
        }

        None
    }

    /// Returns whether the listeners were attached before this call.
    pub fn detach_launch_listeners(&mut self) -> bool {
        std::mem::replace(&mut self.launch_listeners, false)
    }

    pub fn attach_presence_listeners(&mut self) {
        self.presence_listeners = true;
    }

    /// Returns whether the listeners were attached before this call.
    pub fn detach_presence_listeners(&mut self) -> bool {
        std::mem::replace(&mut self.presence_listeners, false)
    }
}
