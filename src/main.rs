mod cli;
mod config;
mod repl;
mod shell;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use log::debug;
use shell::context::ShellContext;
use shell::reaper;
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::os::fd::AsFd;
use std::process;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;

    env_logger::Builder::from_env(env_logger::Env::new().filter_or("MUSH_LOG", &config.log.level)).init();
    if let Some(source) = &config.source {
        debug!("Loaded configuration from {}", source.display());
    }

    if config.shell.reap_zombies && !cli.no_reaper {
        reaper::install().context("Failed to install SIGCHLD handler")?;
    }
    // Ctrl-C interrupts the foreground stages, not the shell.
    ctrlc::set_handler(|| debug!("Interrupt received")).context("Failed to install interrupt handler")?;

    let logic = cli.logic.unwrap_or(config.shell.logic);
    let mut ctx = ShellContext::new().with_logic(logic);

    let status = if let Some(command) = &cli.command {
        repl::run(command.as_bytes(), &mut ctx, None)?
    } else if let Some(script) = &cli.script {
        let file = File::open(script).with_context(|| format!("Failed to open script: {}", script.display()))?;
        repl::run(file, &mut ctx, None)?
    } else {
        // Read fd 0 unbuffered so children started from a line see the
        // input the shell has not consumed yet.
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        let input = File::from(stdin.as_fd().try_clone_to_owned().context("Failed to open stdin")?);
        let prompt = Some(config.shell.prompt.as_str()).filter(|p| interactive && !p.is_empty());
        repl::run(input, &mut ctx, prompt)?
    };

    io::stdout().flush().ok();
    process::exit(status);
}
