// Cd command

use crate::shell::commands::{Arity, Builtin, BuiltinIo, Outcome, BUILTIN_SUCCESS};
use crate::shell::context::ShellContext;
use anyhow::{Context, Result};
use std::path::Path;

pub struct CdCommand;

impl Builtin for CdCommand {
    fn arity(&self) -> Arity {
        Arity::exactly(1)
    }

    fn run(&self, args: &[String], ctx: &mut ShellContext, _io: &mut BuiltinIo) -> Result<Outcome> {
        // args[0] is "cd". args[1] is path.
        let path_str = &args[1];
        ctx.change_dir(Path::new(path_str))
            .with_context(|| path_str.clone())?;
        Ok(Outcome::Status(BUILTIN_SUCCESS))
    }
}
