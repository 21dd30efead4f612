use std::path::PathBuf;

/// One node of a parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Simple command: "echo hello"
    Command(Command),
    // "ls | grep target"
    Pipe,
    // "cargo build && cargo run"
    And,
    // "cargo test || echo failed"
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub executable: String,
    /// argv-style: `args[0]` is the executable name.
    pub args: Vec<String>,
}

impl Command {
    pub fn new(args: Vec<String>) -> Self {
        let executable = args.first().cloned().unwrap_or_default();
        Self { executable, args }
    }

    /// Number of arguments after the command name.
    pub fn arg_count(&self) -> usize {
        self.args.len().saturating_sub(1)
    }
}

/// Where the output of a whole command line goes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OutputTarget {
    #[default]
    Stdout,
    NewFile(PathBuf),    // >
    AppendFile(PathBuf), // >>
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandLine {
    pub exprs: Vec<Expr>,
    pub out: OutputTarget,
}

impl CommandLine {
    pub fn new(exprs: Vec<Expr>, out: OutputTarget) -> Self {
        Self { exprs, out }
    }

    pub fn with_output(mut self, out: OutputTarget) -> Self {
        self.out = out;
        self
    }

    /// Checks the shape the engine relies on: non-empty, starts and ends
    /// with a command, and never two operators in a row.
    pub fn check_shape(&self) -> Result<(), &'static str> {
        match (self.exprs.first(), self.exprs.last()) {
            (None, _) => return Err("empty command line"),
            (Some(Expr::Command(_)), Some(Expr::Command(_))) => {}
            _ => return Err("command line must start and end with a command"),
        }
        for pair in self.exprs.windows(2) {
            let both_ops = !matches!(pair[0], Expr::Command(_)) && !matches!(pair[1], Expr::Command(_));
            let both_cmds = matches!(pair[0], Expr::Command(_)) && matches!(pair[1], Expr::Command(_));
            if both_ops {
                return Err("consecutive operators");
            }
            if both_cmds {
                return Err("commands without a separating operator");
            }
        }
        Ok(())
    }
}
