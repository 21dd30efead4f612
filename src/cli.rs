use clap::Parser;
use std::path::PathBuf;
use crate::shell::context::LogicMode;

#[derive(Parser)]
#[command(name = "mush", version, about = "Mush: a minimal command shell")]
pub struct Cli {
    /// Run COMMAND and exit with its status
    #[arg(short = 'c', value_name = "COMMAND", conflicts_with = "script")]
    pub command: Option<String>,

    /// Read commands from this file instead of stdin
    pub script: Option<PathBuf>,

    /// Configuration file (default: $MUSH_CONFIG, then ./mush.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// How && and || treat the status of what ran before them
    #[arg(long, value_enum)]
    pub logic: Option<LogicMode>,

    /// Do not install the SIGCHLD zombie reaper
    #[arg(long)]
    pub no_reaper: bool,
}
