use std::collections::HashMap;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use clap::ValueEnum;
use serde::Deserialize;
use crate::shell::commands::Builtin;

/// How `&&` and `||` treat the status of what ran before them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LogicMode {
    /// `a && b` runs `b` only if `a` succeeded, `a || b` only if it failed.
    #[default]
    ShortCircuit,
    /// Every stage runs; the operators only wait for what came before.
    AlwaysRun,
}

/// Process-wide shell state. The working directory lives here and in the
/// OS at the same time; `change_dir` is the only place that moves it.
#[derive(Clone)]
pub struct ShellContext {
    pub cwd: PathBuf,
    pub last_status: i32,
    pub logic: LogicMode,
    pub registry: Arc<HashMap<String, Arc<dyn Builtin>>>,
}

impl ShellContext {
    pub fn new() -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut ctx = Self {
            cwd,
            last_status: 0,
            logic: LogicMode::default(),
            registry: Arc::new(HashMap::new()),
        };
        crate::shell::commands::builtins::register_all_builtins(&mut ctx);
        ctx
    }

    pub fn with_logic(mut self, logic: LogicMode) -> Self {
        self.logic = logic;
        self
    }

    pub fn register_command(&mut self, name: &str, command: Box<dyn Builtin>) {
        Arc::make_mut(&mut self.registry).insert(name.to_string(), Arc::from(command));
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Builtin>> {
        self.registry.get(name).cloned()
    }

    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    pub fn change_dir(&mut self, target: &Path) -> io::Result<()> {
        let new_path = self.resolve_path(target);
        env::set_current_dir(&new_path)?;
        // Canonicalize to remove .. and .
        self.cwd = env::current_dir().unwrap_or(new_path);
        Ok(())
    }
}

impl Default for ShellContext {
    fn default() -> Self {
        Self::new()
    }
}
