pub mod icons;
pub mod prompt;
pub mod terminal;

pub use prompt::TerminalPrompt;
pub use terminal::{TerminalUi, print_failure};
