//! The launch sequence: Java, file integrity, process start and monitoring.

pub mod events;
pub mod orchestrator;
pub mod stage;

pub use events::{AssumeInstall, JavaChoice, JavaPrompt, LaunchEvent, ManualChoice};
pub use orchestrator::{LaunchOrchestrator, LaunchServices};
pub use stage::{LaunchOutcome, Stage};
