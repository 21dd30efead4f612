use anyhow::{Context, Result};
use colored::*;
use log::debug;
use std::io::{self, ErrorKind, Read, Write};
use crate::shell::context::ShellContext;
use crate::shell::parser::Parser;
use crate::shell::{execute, Completion};

const READ_CHUNK: usize = 1024;

/// Status recorded for a line the parser rejected.
pub const SYNTAX_ERROR: i32 = 2;

/// Feeds `input` to the parser and runs every complete line. Returns the
/// status the program should exit with: the last line's result, or the code
/// of an in-process `exit`.
pub fn run<R: Read>(mut input: R, ctx: &mut ShellContext, prompt: Option<&str>) -> Result<i32> {
    let mut parser = Parser::new();
    let mut buf = [0u8; READ_CHUNK];
    let mut last_status = 0;

    loop {
        if let Some(prompt) = prompt {
            print!("{}", prompt.green().bold());
            io::stdout().flush().ok();
        }
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("Failed to read input"),
        };
        parser.feed(&buf[..n]);
        if let Some(code) = run_ready(&mut parser, ctx, &mut last_status)? {
            return Ok(code);
        }
    }

    parser.finish();
    if let Some(code) = run_ready(&mut parser, ctx, &mut last_status)? {
        return Ok(code);
    }
    Ok(last_status)
}

/// Runs every line the parser has ready. `Some(code)` means `exit` fired.
fn run_ready(parser: &mut Parser, ctx: &mut ShellContext, last_status: &mut i32) -> Result<Option<i32>> {
    loop {
        let line = match parser.pop_next() {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(None),
            Err(e) => {
                eprintln!("Error: {}", e);
                *last_status = SYNTAX_ERROR;
                continue;
            }
        };

        match execute(&line, ctx) {
            Ok(Completion::Status(code)) => *last_status = code,
            Ok(Completion::Exit(code)) => {
                debug!("exit {} requested", code);
                return Ok(Some(code));
            }
            Err(e) if e.is_fatal() => {
                return Err(e).context("Aborting: received a command line the engine cannot run");
            }
            Err(e) => {
                eprintln!("{} {}", "mush:".red(), e);
                *last_status = 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_str(src: &str) -> i32 {
        let _guard = crate::shell::serial_guard();
        let mut ctx = ShellContext::new();
        run(src.as_bytes(), &mut ctx, None).unwrap()
    }

    #[test]
    fn test_last_line_status_wins() {
        assert_eq!(run_str("false\ntrue\n"), 0);
        assert_eq!(run_str("true\nfalse\n"), 1);
    }

    #[test]
    fn test_unterminated_last_line_runs_at_eof() {
        assert_eq!(run_str("true\nfalse"), 1);
    }

    #[test]
    fn test_exit_stops_reading() {
        assert_eq!(run_str("exit 3\nexit 4\n"), 3);
        assert_eq!(run_str("true | exit 3\nfalse\n"), 1);
    }

    #[test]
    fn test_syntax_error_is_reported_and_skipped() {
        assert_eq!(run_str("| nope\n"), SYNTAX_ERROR);
        assert_eq!(run_str("| nope\ntrue\n"), 0);
    }

    #[test]
    fn test_reads_in_small_chunks() {
        struct Trickle<'a>(&'a [u8]);
        impl Read for Trickle<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                let n = self.0.len().min(3).min(buf.len());
                buf[..n].copy_from_slice(&self.0[..n]);
                self.0 = &self.0[n..];
                Ok(n)
            }
        }
        let _guard = crate::shell::serial_guard();
        let mut ctx = ShellContext::new();
        let status = run(Trickle(b"true && false || exit 12\n"), &mut ctx, None).unwrap();
        assert_eq!(status, 12);
    }
}
