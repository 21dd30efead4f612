pub mod builtins;

use crate::shell::context::ShellContext;
use anyhow::Result;
use std::io::Write;

pub const BUILTIN_SUCCESS: i32 = 0;
pub const BUILTIN_ERROR: i32 = 1;

/// What a builtin asks of the process running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Status(i32),
    /// Terminate the invoking process: the whole shell when run in-process,
    /// only the child when forked into a pipeline.
    Exit(i32),
}

impl Outcome {
    pub fn code(self) -> i32 {
        match self {
            Outcome::Status(code) | Outcome::Exit(code) => code,
        }
    }
}

/// Accepted number of arguments, not counting the command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const ANY: Arity = Arity { min: 0, max: None };

    pub const fn exactly(n: usize) -> Self {
        Arity { min: n, max: Some(n) }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Arity { min, max: Some(max) }
    }
}

/// Output streams handed to a builtin. In the shell process these are the
/// real stdout/stderr; in a forked stage they are fresh handles on fd 1/2.
pub struct BuiltinIo<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

pub trait Builtin: Send + Sync {
    fn arity(&self) -> Arity {
        Arity::ANY
    }

    /// `args[0]` is the command name.
    fn run(&self, args: &[String], ctx: &mut ShellContext, io: &mut BuiltinIo) -> Result<Outcome>;
}

/// Checks the argument count, runs the handler and turns handler errors
/// into a diagnostic plus `BUILTIN_ERROR`.
pub fn invoke(
    builtin: &dyn Builtin,
    args: &[String],
    ctx: &mut ShellContext,
    io: &mut BuiltinIo,
) -> Outcome {
    let name = args.first().map(String::as_str).unwrap_or("builtin");
    let count = args.len().saturating_sub(1);
    let arity = builtin.arity();

    if count < arity.min {
        writeln!(io.err, "{}: not enough arguments", name).ok();
        return Outcome::Status(BUILTIN_ERROR);
    }
    if arity.max.is_some_and(|max| count > max) {
        writeln!(io.err, "{}: too many arguments", name).ok();
        return Outcome::Status(BUILTIN_ERROR);
    }

    match builtin.run(args, ctx, io) {
        Ok(outcome) => outcome,
        Err(e) => {
            writeln!(io.err, "{}: {:#}", name, e).ok();
            Outcome::Status(BUILTIN_ERROR)
        }
    }
}
