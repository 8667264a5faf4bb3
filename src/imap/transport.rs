//! The transport collaborator: everything the parser needs from the
//! connection without owning the socket itself.
//!
//! The parser is synchronous in spirit -- it consumes a cursor over a
//! command line -- but literals mean it sometimes has to go back to the
//! wire mid-command, and that I/O is async. `Transport` is the seam: the
//! connection layer implements it over a real `TcpStream`, tests implement
//! it over an in-memory script.

use async_trait::async_trait;

use crate::imap::error::TransportError;

/// Capability flags visible to the parser. The parser never negotiates
/// capabilities itself -- that's connection setup, out of its scope -- it
/// only reads the flags the session already settled on, e.g. to decide
/// whether `~{n}` (IMAP4rev2 literal8) or UTF-7 mailbox decoding apply.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub imap4rev2: bool,
    pub literal_plus: bool,
    pub binary: bool,
}

/// Everything the parser needs from the connection.
///
/// All methods are async because satisfying a literal read means reading
/// from the socket, but the trait has to be usable as `dyn Transport` so a
/// single cursor type can be shared across every parser function without
/// threading a generic parameter through the whole module. `async-trait`
/// buys us that by boxing the returned futures, the same trick the
/// generated code for any hand-written `Pin<Box<dyn Future>>` trait object
/// would use.
#[async_trait]
pub trait Transport: Send {
    /// Read exactly `size` octets of literal data. When `sync` is `true`
    /// the implementation must first send the `+ ` continuation request
    /// before reading; when `false` (a non-synchronizing literal, `{n+}`)
    /// the client already sent the bytes without being prompted.
    async fn read_literal(&mut self, size: u64, sync: bool) -> Result<Vec<u8>, TransportError>;

    /// Read the next line of input (terminated by CRLF, stripped), used
    /// both to get the first line of a command and to pull the remainder
    /// of a command line after a literal has rebound the cursor.
    async fn read_line(&mut self) -> Result<String, TransportError>;

    /// The authenticated account name, if any. `None` before LOGIN.
    fn account(&self) -> Option<&str>;

    /// Capability flags in effect for this connection.
    fn capabilities(&self) -> &Capabilities;

    /// Structured log hook, used by the parser to note non-fatal events
    /// (e.g. a mailbox name that failed UTF-7 decoding and was passed
    /// through verbatim) without owning a logger itself.
    fn log(&self, event: &str, error: Option<&(dyn std::error::Error + Send + Sync)>);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::VecDeque;

    /// A scripted transport for unit tests: lines and literal bytes are
    /// queued up front, `read_line`/`read_literal` drain them in order.
    pub struct ScriptedTransport {
        lines: VecDeque<String>,
        literals: VecDeque<Vec<u8>>,
        capabilities: Capabilities,
        account: Option<String>,
        pub continuation_requests: usize,
    }

    impl ScriptedTransport {
        pub fn new(lines: Vec<&str>) -> Self {
            Self {
                lines: lines.into_iter().map(str::to_owned).collect(),
                literals: VecDeque::new(),
                capabilities: Capabilities::default(),
                account: None,
                continuation_requests: 0,
            }
        }

        pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
            self.capabilities = capabilities;
            self
        }

        pub fn push_literal(mut self, bytes: impl Into<Vec<u8>>) -> Self {
            self.literals.push_back(bytes.into());
            self
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn read_literal(&mut self, size: u64, sync: bool) -> Result<Vec<u8>, TransportError> {
            if sync {
                self.continuation_requests += 1;
            }
            let bytes = self
                .literals
                .pop_front()
                .ok_or(TransportError::Closed("literal"))?;
            if bytes.len() as u64 != size {
                return Err(TransportError::Closed("literal"));
            }
            Ok(bytes)
        }

        async fn read_line(&mut self) -> Result<String, TransportError> {
            self.lines.pop_front().ok_or(TransportError::Closed("line"))
        }

        fn account(&self) -> Option<&str> {
            self.account.as_deref()
        }

        fn capabilities(&self) -> &Capabilities {
            &self.capabilities
        }

        fn log(&self, _event: &str, _error: Option<&(dyn std::error::Error + Send + Sync)>) {}
    }
}
