pub mod env;
pub mod io;
pub mod status;

use crate::shell::context::ShellContext;

/// Helper to register all built-in commands at once
pub fn register_all_builtins(ctx: &mut ShellContext) {
    // Env/Navigation
    ctx.register_command("cd", Box::new(env::cd::CdCommand));
    ctx.register_command("exit", Box::new(env::exit::ExitCommand));
    ctx.register_command("pwd", Box::new(env::pwd::PwdCommand));

    // Status
    ctx.register_command("true", Box::new(status::TrueCommand));
    ctx.register_command("false", Box::new(status::FalseCommand));

    // IO
    ctx.register_command("echo", Box::new(io::echo::EchoCommand));
}
