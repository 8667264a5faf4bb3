//! Parser-facing configuration: the handful of limits the command parser
//! itself enforces. Everything else an IMAP deployment might configure
//! (bind address, STARTTLS, connection caps, storage paths, ...) belongs
//! to the connection layer this parser is deliberately decoupled from --
//! see the module-level docs.
//!
//! Deserialized with the same `serde` + per-field default-function
//! convention the rest of the server's configuration uses, so a
//! `[imap.parser]` table in the on-disk config slots in the same way
//! `[imap]` itself does.

use serde::{Deserialize, Serialize};

/// Literal and structural limits the parser enforces while reading a
/// command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Ceiling, in octets, on any literal the parser will ask the
    /// transport to read (`APPEND` message bodies, long `SEARCH`
    /// strings, ...). `0` means unbounded. Exceeding it fails the
    /// command with the `TOOBIG` response code before any octets are
    /// read off the wire.
    #[serde(default = "default_max_literal")]
    pub max_literal_octets: u64,

    /// Hard cap on the number of bytes buffered for a single command
    /// line (excluding literal payloads, which are governed by
    /// `max_literal_octets`). Guards against a client that never sends
    /// `CRLF`.
    #[serde(default = "default_max_line_octets")]
    pub max_line_octets: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_literal_octets: default_max_literal(),
            max_line_octets: default_max_line_octets(),
        }
    }
}

fn default_max_literal() -> u64 {
    25 * 1024 * 1024
}

fn default_max_line_octets() -> usize {
    8 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_nonzero() {
        let cfg = ParserConfig::default();
        assert!(cfg.max_literal_octets > 0);
        assert!(cfg.max_line_octets > 0);
    }
}
