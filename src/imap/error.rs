//! Error surface for the command parser.
//!
//! Two kinds of failure can come out of parsing a command line: a syntax
//! error, which the parser itself diagnosed and which carries enough
//! context to report back to the client, and a transport error, which
//! propagates straight through from whatever collaborator supplied the
//! bytes (a dead socket, a client that disconnected mid-literal). The
//! caller needs to tell these apart -- a transport error means the
//! connection is gone and nothing should be written back to it.

use thiserror::Error;

/// A single parse failure, carrying enough to build a useful client-facing
/// diagnostic without re-parsing anything.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Human-readable description of what was expected.
    pub message: String,
    /// The stack of grammar productions active when the failure occurred,
    /// outermost first (e.g. `["command", "fetch", "fetch-att"]`).
    pub context: Vec<&'static str>,
    /// A short, lossily-decoded preview of the unconsumed input, truncated
    /// so a malicious or oversized line can't blow up an error message.
    pub remaining_preview: String,
    /// A machine-readable response code, when the failure maps to one
    /// (e.g. `"TOOBIG"`).
    pub code: Option<&'static str>,
    /// A fully-formatted continuation line the caller may write back to
    /// the client before failing the command, e.g. the `* BYE [ALERT] ...`
    /// line that accompanies an oversized literal.
    pub continuation: Option<String>,
}

impl ParseError {
    pub fn context_path(&self) -> String {
        self.context.join("/")
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (in {}, near {:?})",
            self.message,
            self.context_path(),
            self.remaining_preview
        )
    }
}

impl std::error::Error for ParseError {}

/// Failure of the transport collaborator itself: a dead socket, a
/// disconnect mid-literal, or anything else that isn't a grammar problem.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection closed while reading {0}")]
    Closed(&'static str),

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The top-level result of trying to parse one command line.
#[derive(Debug, Error)]
pub enum Failure {
    #[error("{0}")]
    Syntax(#[from] ParseError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type ParseResult<T> = Result<T, Failure>;
