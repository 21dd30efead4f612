//! Zombie reaping.
//!
//! The SIGCHLD handler only records that some child changed state. The
//! actual reap-all runs from `sweep`, which the engine calls once a command
//! line's queue is empty, so it never collects a child the queue still owns.

use std::sync::atomic::{AtomicBool, Ordering};
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

static CHILD_EXITED: AtomicBool = AtomicBool::new(false);

extern "C" fn note_child_exit(_signal: nix::libc::c_int) {
    CHILD_EXITED.store(true, Ordering::SeqCst);
}

pub fn install() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(note_child_exit),
        SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
        SigSet::empty(),
    );
    // SAFETY: the handler only stores to an atomic, which is async-signal-safe.
    unsafe { sigaction(Signal::SIGCHLD, &action) }?;
    debug!("SIGCHLD reaper installed");
    Ok(())
}

/// Reaps every terminated child if a SIGCHLD arrived since the last sweep.
/// Returns how many were collected.
pub fn sweep() -> usize {
    if !CHILD_EXITED.swap(false, Ordering::SeqCst) {
        return 0;
    }
    reap_all()
}

fn reap_all() -> usize {
    let mut reaped = 0;
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status) => {
                debug!("Reaped orphaned child: {:?}", status);
                reaped += 1;
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => break,
            Err(e) => {
                warn!("Reaper sweep failed: {}", e);
                break;
            }
        }
    }
    reaped
}
