use std::ffi::{CString, NulError};
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::AsFd;
use std::process;
use log::{debug, error};
use nix::errno::Errno;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::{execvp, fork, ForkResult};
use os_pipe::PipeReader;
use crate::shell::ast::{Command, CommandLine, Expr};
use crate::shell::commands::{self, Builtin, BuiltinIo, Outcome};
use crate::shell::context::{LogicMode, ShellContext};
use crate::shell::error::ExecError;
use crate::shell::queue::PendingQueue;
use crate::shell::reaper;
use crate::shell::wiring::{self, StageIo, StreamGuard};

/// Status of a stage that could not be started.
pub const LAUNCH_FAILED: i32 = 1;
/// Exec found the program but could not run it.
pub const EXEC_FAILED: i32 = 126;
pub const NOT_FOUND: i32 = 127;

/// How a command line ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Status(i32),
    /// An in-process `exit` asked the shell to terminate with this code.
    Exit(i32),
}

pub fn execute(line: &CommandLine, ctx: &mut ShellContext) -> Result<Completion, ExecError> {
    line.check_shape().map_err(ExecError::Malformed)?;

    let redirect = wiring::open_target(&line.out, ctx)?;
    let completion = {
        let _streams = StreamGuard::capture()?;
        walk(line, ctx, redirect.as_ref())?
    };
    drop(redirect);

    if let Completion::Status(code) = completion {
        ctx.last_status = code;
    }
    // Every stage of this line has been waited for, so whatever is left
    // belongs to nobody.
    let reaped = reaper::sweep();
    if reaped > 0 {
        debug!("Reaped {} orphaned child(ren)", reaped);
    }
    Ok(completion)
}

fn walk(line: &CommandLine, ctx: &mut ShellContext, redirect: Option<&File>) -> Result<Completion, ExecError> {
    let mut queue = PendingQueue::new();
    let mut upstream: Option<PipeReader> = None;
    let mut status = 0;
    let mut skipping = false;
    // Once a pipe has appeared on the line, later builtins fork too.
    let mut piped = false;

    for (i, expr) in line.exprs.iter().enumerate() {
        match expr {
            Expr::Command(cmd) => {
                if skipping {
                    debug!("Skipping: {}", shell_words::join(&cmd.args));
                    continue;
                }
                let will_pipe = matches!(line.exprs.get(i + 1), Some(Expr::Pipe));
                let (sibling, output) = if will_pipe {
                    let (reader, writer) = wiring::open_pipe()?;
                    (Some(reader), Some(writer))
                } else {
                    (None, None)
                };
                if !will_pipe {
                    if let Some(file) = redirect {
                        wiring::redirect_stdout(file, &line.out)?;
                    }
                }

                let io = StageIo {
                    input: upstream.take(),
                    output,
                    sibling,
                };
                let in_process = io.is_plain() && !piped;
                piped |= will_pipe;
                match run_stage(cmd, io, in_process, ctx, &mut queue) {
                    Started::Next(next) => upstream = next,
                    Started::Exit(code) => {
                        queue.drain_wait();
                        return Ok(Completion::Exit(code));
                    }
                }
            }
            Expr::Pipe => {}
            Expr::And | Expr::Or => {
                if !skipping {
                    status = queue.drain_wait().unwrap_or(status);
                }
                skipping = match ctx.logic {
                    LogicMode::AlwaysRun => false,
                    LogicMode::ShortCircuit if *expr == Expr::And => status != 0,
                    LogicMode::ShortCircuit => status == 0,
                };
            }
        }
    }

    Ok(Completion::Status(queue.drain_wait().unwrap_or(status)))
}

enum Started {
    /// Read end of the pipe the stage writes into, if it pipes onward.
    Next(Option<PipeReader>),
    /// An in-process `exit` fired.
    Exit(i32),
}

fn run_stage(
    cmd: &Command,
    io: StageIo,
    in_process: bool,
    ctx: &mut ShellContext,
    queue: &mut PendingQueue,
) -> Started {
    match ctx.lookup(&cmd.executable) {
        Some(builtin) if in_process => {
            debug!("Builtin in-process: {}", shell_words::join(&cmd.args));
            let stdout = io::stdout();
            let stderr = io::stderr();
            let (mut out, mut err) = (stdout.lock(), stderr.lock());
            let outcome = commands::invoke(
                builtin.as_ref(),
                &cmd.args,
                ctx,
                &mut BuiltinIo { out: &mut out, err: &mut err },
            );
            match outcome {
                Outcome::Status(code) => {
                    queue.push_settled(code);
                    Started::Next(io.release())
                }
                Outcome::Exit(code) => Started::Exit(code),
            }
        }
        Some(builtin) => Started::Next(launch(cmd, io, queue, || run_forked_builtin(builtin.as_ref(), cmd, ctx))),
        None => match ExecArgs::new(cmd) {
            Ok(exec) => Started::Next(launch(cmd, io, queue, || exec_external(&exec, &cmd.executable))),
            Err(_) => {
                eprintln!("mush: {}: argument contains a NUL byte", cmd.executable);
                queue.push_settled(EXEC_FAILED);
                Started::Next(io.release())
            }
        },
    }
}

/// Forks one stage. Returns the read end the next stage should take.
fn launch(cmd: &Command, io: StageIo, queue: &mut PendingQueue, body: impl FnOnce() -> i32) -> Option<PipeReader> {
    debug!("Launching stage: {}", shell_words::join(&cmd.args));
    // Anything still buffered would be written twice, once per process.
    io::stdout().flush().ok();
    io::stderr().flush().ok();

    // SAFETY: the child only rewires descriptors, then either execs or runs a
    // builtin and exits; it never returns into the engine.
    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let code = match io.attach() {
                Ok(()) => body(),
                Err(e) => {
                    eprintln!("mush: {}: cannot connect pipe: {}", cmd.executable, e.desc());
                    LAUNCH_FAILED
                }
            };
            io::stdout().flush().ok();
            process::exit(code);
        }
        Ok(ForkResult::Parent { child }) => {
            queue.push_child(child);
            io.release()
        }
        Err(e) => {
            error!("fork failed for {}: {}", cmd.executable, e);
            eprintln!("mush: {}: cannot fork: {}", cmd.executable, e.desc());
            queue.push_settled(LAUNCH_FAILED);
            io.release()
        }
    }
}

fn run_forked_builtin(builtin: &dyn Builtin, cmd: &Command, ctx: &mut ShellContext) -> i32 {
    let (mut out, mut err) = match child_streams() {
        Ok(streams) => streams,
        Err(e) => {
            eprintln!("mush: {}: {}", cmd.executable, e);
            return LAUNCH_FAILED;
        }
    };
    // A forked `exit` ends this child only; both outcomes become its status.
    commands::invoke(builtin, &cmd.args, ctx, &mut BuiltinIo { out: &mut out, err: &mut err }).code()
}

// Fresh handles on fd 1/2, so nothing depends on locks another thread may
// have held at fork time.
fn child_streams() -> io::Result<(File, File)> {
    let out = io::stdout().as_fd().try_clone_to_owned()?;
    let err = io::stderr().as_fd().try_clone_to_owned()?;
    Ok((File::from(out), File::from(err)))
}

/// Program and argv as C strings, built before forking so the child does
/// not allocate.
struct ExecArgs {
    program: CString,
    argv: Vec<CString>,
}

impl ExecArgs {
    fn new(cmd: &Command) -> Result<Self, NulError> {
        let program = CString::new(cmd.executable.as_bytes())?;
        let argv = cmd
            .args
            .iter()
            .map(|a| CString::new(a.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { program, argv })
    }
}

fn exec_external(exec: &ExecArgs, name: &str) -> i32 {
    // Rust starts with SIGPIPE ignored and exec would carry that over.
    // SAFETY: restoring the default disposition installs no handler code.
    unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) }.ok();

    let errno = match execvp(&exec.program, &exec.argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    exec_failure(name, errno)
}

fn exec_failure(name: &str, errno: Errno) -> i32 {
    if errno == Errno::ENOENT {
        eprintln!("mush: {}: command not found", name);
        NOT_FOUND
    } else {
        eprintln!("mush: {}: {}", name, errno.desc());
        EXEC_FAILED
    }
}
