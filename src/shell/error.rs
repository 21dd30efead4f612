use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop a command line before or while its stages launch.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("cannot open {}: {source}", path.display())]
    RedirectionFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create pipe: {0}")]
    PipeFailed(#[source] io::Error),

    #[error("failed to save standard streams: {0}")]
    StreamSaveFailed(#[source] io::Error),

    #[error("malformed command line: {0}")]
    Malformed(&'static str),
}

impl ExecError {
    /// A malformed line means the parser broke its contract; nothing
    /// sensible can follow.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecError::Malformed(_))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("syntax error: missing command near '{0}'")]
    MissingCommand(&'static str),

    #[error("syntax error: expected a file name after '{0}'")]
    MissingRedirectTarget(&'static str),

    #[error("syntax error: only one output redirection per line")]
    DuplicateRedirect,

    #[error("syntax error: unterminated quote")]
    UnterminatedQuote,

    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(&'static str),
}
