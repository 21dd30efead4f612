use std::collections::VecDeque;
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;

/// Status reported for a child that did not exit normally (killed by a
/// signal, or lost to a failed wait).
pub const ABNORMAL_EXIT: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Child(Pid),
    /// A stage that finished without a child process: an in-process builtin
    /// or a stage whose fork failed.
    Settled(i32),
}

/// Stages of one command line in launch order. Entries leave only by being
/// waited for.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: VecDeque<Pending>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_child(&mut self, pid: Pid) {
        self.entries.push_back(Pending::Child(pid));
    }

    pub fn push_settled(&mut self, status: i32) {
        self.entries.push_back(Pending::Settled(status));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes the oldest entry, blocking until that specific child has
    /// terminated.
    pub fn pop_wait(&mut self) -> Option<i32> {
        self.entries.pop_front().map(|entry| match entry {
            Pending::Child(pid) => wait_for(pid),
            Pending::Settled(status) => status,
        })
    }

    /// Waits for everything left, oldest first. Only the last status is kept.
    pub fn drain_wait(&mut self) -> Option<i32> {
        let mut last = None;
        while let Some(status) = self.pop_wait() {
            last = Some(status);
        }
        last
    }
}

impl Drop for PendingQueue {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            debug!("Reaping {} stage(s) left behind by an aborted line", self.entries.len());
            self.drain_wait();
        }
    }
}

fn wait_for(pid: Pid) -> i32 {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!("Child {} exited with {}", pid, code);
                return code;
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                debug!("Child {} killed by {:?}", pid, signal);
                return ABNORMAL_EXIT;
            }
            Ok(other) => {
                warn!("Unexpected wait status for {}: {:?}", pid, other);
                return ABNORMAL_EXIT;
            }
            Err(Errno::EINTR) => continue,
            Err(e) => {
                warn!("waitpid({}) failed: {}", pid, e);
                return ABNORMAL_EXIT;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn spawn_sh(script: &str) -> Pid {
        let child = Command::new("sh").args(["-c", script]).spawn().unwrap();
        Pid::from_raw(child.id() as i32)
    }

    #[test]
    fn test_pop_wait_returns_exit_code_in_fifo_order() {
        let _guard = crate::shell::serial_guard();
        let mut queue = PendingQueue::new();
        queue.push_child(spawn_sh("sleep 0.2; exit 3"));
        queue.push_child(spawn_sh("exit 5"));

        assert_eq!(queue.pop_wait(), Some(3));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_wait(), Some(5));
        assert_eq!(queue.pop_wait(), None);
    }

    #[test]
    fn test_drain_wait_keeps_last_status() {
        let _guard = crate::shell::serial_guard();
        let mut queue = PendingQueue::new();
        queue.push_child(spawn_sh("exit 1"));
        queue.push_settled(4);
        queue.push_child(spawn_sh("exit 0"));

        assert_eq!(queue.drain_wait(), Some(0));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_wait_on_empty_queue() {
        let mut queue = PendingQueue::new();
        assert_eq!(queue.drain_wait(), None);
    }

    #[test]
    fn test_signaled_child_maps_to_sentinel() {
        let _guard = crate::shell::serial_guard();
        let mut queue = PendingQueue::new();
        queue.push_child(spawn_sh("kill -9 $$"));
        assert_eq!(queue.pop_wait(), Some(ABNORMAL_EXIT));
    }

    #[test]
    fn test_drop_reaps_remaining_children() {
        let _guard = crate::shell::serial_guard();
        let pid = spawn_sh("exit 0");
        {
            let mut queue = PendingQueue::new();
            queue.push_child(pid);
        }
        // Already collected by the drop.
        assert_eq!(waitpid(pid, None), Err(Errno::ECHILD));
    }
}
