// CLI module - Command line interface
pub mod args;
pub mod commands;
pub mod settings;

pub use args::Args;
pub use commands::{execute_command, RunOutcome};
pub use settings::Settings;
