use crate::shell::commands::{Builtin, BuiltinIo, Outcome, BUILTIN_ERROR, BUILTIN_SUCCESS};
use crate::shell::context::ShellContext;
use anyhow::Result;

pub struct TrueCommand;

impl Builtin for TrueCommand {
    fn run(&self, _args: &[String], _ctx: &mut ShellContext, _io: &mut BuiltinIo) -> Result<Outcome> {
        Ok(Outcome::Status(BUILTIN_SUCCESS))
    }
}

pub struct FalseCommand;

impl Builtin for FalseCommand {
    fn run(&self, _args: &[String], _ctx: &mut ShellContext, _io: &mut BuiltinIo) -> Result<Outcome> {
        Ok(Outcome::Status(BUILTIN_ERROR))
    }
}
