// Exit command

use crate::shell::commands::{Arity, Builtin, BuiltinIo, Outcome, BUILTIN_SUCCESS};
use crate::shell::context::ShellContext;
use anyhow::Result;
use std::io::Write;

/// Status used when the argument is not a number.
pub const EXIT_USAGE: i32 = 2;

pub struct ExitCommand;

impl Builtin for ExitCommand {
    fn arity(&self) -> Arity {
        Arity::between(0, 1)
    }

    fn run(&self, args: &[String], _ctx: &mut ShellContext, io: &mut BuiltinIo) -> Result<Outcome> {
        let Some(arg) = args.get(1) else {
            return Ok(Outcome::Exit(BUILTIN_SUCCESS));
        };
        match arg.trim().parse::<i32>() {
            Ok(code) => Ok(Outcome::Exit(code)),
            Err(_) => {
                writeln!(io.err, "exit: {}: numeric argument required", arg).ok();
                Ok(Outcome::Exit(EXIT_USAGE))
            }
        }
    }
}
