use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;
use log::warn;
use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::dup2;
use os_pipe::{PipeReader, PipeWriter};
use crate::shell::ast::OutputTarget;
use crate::shell::context::ShellContext;
use crate::shell::error::ExecError;

/// Permission bits for files created by `>` and `>>`.
pub const REDIRECT_MODE: u32 = 0o644;

/// Opens the line's redirection target. Relative paths resolve against the
/// shell's working directory at the time the line runs.
pub fn open_target(target: &OutputTarget, ctx: &ShellContext) -> Result<Option<File>, ExecError> {
    let (path, append) = match target {
        OutputTarget::Stdout => return Ok(None),
        OutputTarget::NewFile(path) => (path, false),
        OutputTarget::AppendFile(path) => (path, true),
    };

    let mut open_opts = OpenOptions::new();
    if append {
        open_opts.create(true).append(true);
    } else {
        open_opts.write(true).create(true).truncate(true);
    }
    open_opts.mode(REDIRECT_MODE);

    open_opts
        .open(ctx.resolve_path(path))
        .map(Some)
        .map_err(|source| ExecError::RedirectionFailed {
            path: path.clone(),
            source,
        })
}

/// Points fd 1 at the redirection file for the rest of the line.
pub fn redirect_stdout(file: &File, target: &OutputTarget) -> Result<(), ExecError> {
    io::stdout().flush().ok();
    dup2(file.as_raw_fd(), STDOUT_FILENO)
        .map(drop)
        .map_err(|errno| ExecError::RedirectionFailed {
            path: match target {
                OutputTarget::NewFile(p) | OutputTarget::AppendFile(p) => p.clone(),
                OutputTarget::Stdout => "<stdout>".into(),
            },
            source: errno.into(),
        })
}

pub fn open_pipe() -> Result<(PipeReader, PipeWriter), ExecError> {
    // os_pipe sets close-on-exec on both ends; dup2 onto 0/1 clears it.
    os_pipe::pipe().map_err(ExecError::PipeFailed)
}

/// Copies of the shell's own stdin/stdout taken before a line runs and
/// put back when the guard drops, on every exit path.
pub struct StreamGuard {
    stdin: OwnedFd,
    stdout: OwnedFd,
}

impl StreamGuard {
    pub fn capture() -> Result<Self, ExecError> {
        let stdin = io::stdin()
            .as_fd()
            .try_clone_to_owned()
            .map_err(ExecError::StreamSaveFailed)?;
        let stdout = io::stdout()
            .as_fd()
            .try_clone_to_owned()
            .map_err(ExecError::StreamSaveFailed)?;
        Ok(Self { stdin, stdout })
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        io::stdout().flush().ok();
        if let Err(e) = dup2(self.stdout.as_raw_fd(), STDOUT_FILENO) {
            warn!("Failed to restore stdout: {}", e);
        }
        if let Err(e) = dup2(self.stdin.as_raw_fd(), STDIN_FILENO) {
            warn!("Failed to restore stdin: {}", e);
        }
    }
}

/// Pipe ends one stage is launched with: stdin from the previous stage,
/// stdout into the next one, and the read end of that same pipe, which
/// only the next stage may keep.
#[derive(Debug, Default)]
pub struct StageIo {
    pub input: Option<PipeReader>,
    pub output: Option<PipeWriter>,
    pub sibling: Option<PipeReader>,
}

impl StageIo {
    pub fn is_plain(&self) -> bool {
        self.input.is_none() && self.output.is_none()
    }

    /// Child side: installs the pipe ends on fd 0/1. The original
    /// descriptors close when this returns.
    pub fn attach(self) -> nix::Result<()> {
        let StageIo { input, output, sibling } = self;
        // A builtin child never execs, so close-on-exec would not help here.
        drop(sibling);
        if let Some(input) = &input {
            dup2(input.as_raw_fd(), STDIN_FILENO)?;
        }
        if let Some(output) = &output {
            dup2(output.as_raw_fd(), STDOUT_FILENO)?;
        }
        Ok(())
    }

    /// Parent side, once the stage is started: closes the ends the stage
    /// owns and hands back the read end for the next stage.
    pub fn release(self) -> Option<PipeReader> {
        self.sibling
    }
}
