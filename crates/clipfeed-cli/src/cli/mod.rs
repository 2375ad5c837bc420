mod config;
mod runner;

pub use config::{CliConfig, Credentials};
pub use runner::{execute, open_workspace, CliCommand, Workspace};
