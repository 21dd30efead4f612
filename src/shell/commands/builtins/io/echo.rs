// Echo command

use crate::shell::commands::{Builtin, BuiltinIo, Outcome, BUILTIN_SUCCESS};
use crate::shell::context::ShellContext;
use anyhow::Result;
use std::io::Write;

pub struct EchoCommand;

impl Builtin for EchoCommand {
    fn run(&self, args: &[String], _ctx: &mut ShellContext, io: &mut BuiltinIo) -> Result<Outcome> {
        // Skip "echo" in args[0]
        let output = args[1..].join(" ");
        writeln!(io.out, "{}", output)?;
        io.out.flush()?;
        Ok(Outcome::Status(BUILTIN_SUCCESS))
    }
}
