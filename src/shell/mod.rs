pub mod ast;
pub mod commands;
pub mod context;
pub mod error;
pub mod executor;
pub mod parser;
pub mod queue;
pub mod reaper;
pub mod wiring;

pub use executor::{execute, Completion};


/// Tests that fork, wait, chdir or touch fd 0/1 share process-wide state and
/// must not overlap.
#[cfg(test)]
pub(crate) fn serial_guard() -> std::sync::MutexGuard<'static, ()> {
    static SERIAL: std::sync::Mutex<()> = std::sync::Mutex::new(());
    SERIAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
