use crate::shell::commands::{Arity, Builtin, BuiltinIo, Outcome, BUILTIN_SUCCESS};
use crate::shell::context::ShellContext;
use anyhow::{Context, Result};
use std::env;
use std::io::Write;

pub struct PwdCommand;

impl Builtin for PwdCommand {
    fn arity(&self) -> Arity {
        Arity::exactly(0)
    }

    fn run(&self, _args: &[String], _ctx: &mut ShellContext, io: &mut BuiltinIo) -> Result<Outcome> {
        // Ask the OS: the directory may have been removed under us.
        let cwd = env::current_dir().context("cannot determine current directory")?;
        writeln!(io.out, "{}", cwd.display())?;
        Ok(Outcome::Status(BUILTIN_SUCCESS))
    }
}
