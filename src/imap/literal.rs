//! The literal coordinator: `{n}`, `{n+}` and `~{n}` syntax, and the
//! hand-off to the transport to actually pull the octets off the wire.
//!
//! This is the one place parsing stops being purely synchronous. Reading
//! a literal means: enforce the configured size ceiling *before* touching
//! the transport (an oversized literal must never cause a read of data
//! the server has already decided to refuse), ask the transport for the
//! bytes (sending a `+` continuation request first unless the literal was
//! non-synchronizing), then read one more line from the transport and
//! rebind the cursor to it so parsing can continue with whatever follows
//! the literal on the wire.

use crate::imap::cursor::Cursor;
use crate::imap::error::{Failure, ParseError};

/// Parsed `{size[+]}` / `~{size[+]}` header, not yet resolved against a
/// transport read.
struct LiteralHeader {
    size: u64,
    sync: bool,
}

/// True if the upcoming bytes look like a literal header (`{` or, when
/// `lit8_allowed`, `~{`). Used by callers that need to choose between a
/// quoted string and a literal without committing to either.
pub fn looks_like_literal(cursor: &Cursor<'_>, lit8_allowed: bool) -> bool {
    cursor.peek() == Some(b'{') || (lit8_allowed && cursor.has_prefix(b"~{"))
}

fn parse_header(cursor: &mut Cursor<'_>, lit8_allowed: bool) -> Result<LiteralHeader, ParseError> {
    let _ctx = cursor.context("literal");
    if lit8_allowed {
        cursor.take(b"~");
    }
    cursor.xtake(b"{")?;
    let digits = cursor.digits();
    if digits.is_empty() {
        return Err(cursor.fail("expected literal octet count"));
    }
    let size: u64 = std::str::from_utf8(&digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| cursor.fail("literal octet count overflows"))?;
    let sync = !cursor.take(b"+");
    cursor.xtake(b"}")?;
    if !cursor.is_empty() {
        return Err(cursor.fail("unexpected data after literal header"));
    }
    Ok(LiteralHeader { size, sync })
}

/// Read a literal's payload, having already established (via
/// [`looks_like_literal`]) that one is present. `max_size` of `0` means no
/// configured ceiling. On success the cursor is rebound to the line that
/// followed the literal on the wire.
pub async fn read_literal(
    cursor: &mut Cursor<'_>,
    lit8_allowed: bool,
    max_size: u64,
) -> Result<Vec<u8>, Failure> {
    let header = parse_header(cursor, lit8_allowed)?;

    if max_size > 0 && header.size > max_size {
        let continuation = format!(
            "* BYE [ALERT] Max literal size {} is larger than allowed {} in this context\r\n",
            header.size, max_size
        );
        let err = cursor.fail_with_code(
            format!(
                "literal of {} octets exceeds the {} octet limit",
                header.size, max_size
            ),
            "TOOBIG",
            continuation,
        );
        cursor.transport().log("literal_too_big", Some(&err));
        return Err(Failure::Syntax(err));
    }

    let bytes = cursor
        .transport()
        .read_literal(header.size, header.sync)
        .await?;
    cursor.transport().log(
        if header.sync { "literal_read_sync" } else { "literal_read_nonsync" },
        None,
    );

    let rest_of_line = cursor.transport().read_line().await?;
    cursor.rebind(rest_of_line);

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imap::transport::test_support::ScriptedTransport;
    use pretty_assertions::assert_eq;
    use crate::imap::transport::Capabilities;

    #[tokio::test]
    async fn reads_synchronizing_literal_and_rebinds() {
        let mut t = ScriptedTransport::new(vec!["FLAGS (\\Seen)"]).push_literal(*b"hello");
        let mut c = Cursor::new("{5}".to_string(), &mut t);
        let bytes = read_literal(&mut c, false, 0).await.unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(c.remaining_original(), b"FLAGS (\\Seen)");
    }

    #[tokio::test]
    async fn rejects_non_sync_marker_when_present() {
        let mut t = ScriptedTransport::new(vec![""]).push_literal(*b"ab");
        let mut c = Cursor::new("{2+}".to_string(), &mut t);
        let bytes = read_literal(&mut c, false, 0).await.unwrap();
        assert_eq!(bytes, b"ab");
        assert_eq!(t.continuation_requests, 0);
    }

    #[tokio::test]
    async fn enforces_max_size_before_touching_transport() {
        let mut t = ScriptedTransport::new(vec![]).with_capabilities(Capabilities::default());
        let mut c = Cursor::new("{1000}".to_string(), &mut t);
        let err = read_literal(&mut c, false, 100).await.unwrap_err();
        match err {
            Failure::Syntax(e) => {
                assert_eq!(e.code, Some("TOOBIG"));
                assert!(e.continuation.unwrap().contains("Max literal size 1000"));
            }
            Failure::Transport(_) => panic!("expected a syntax failure, not a transport read"),
        }
    }

    #[tokio::test]
    async fn lit8_requires_caller_opt_in() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = Cursor::new("~{3}".to_string(), &mut t);
        assert!(!looks_like_literal(&c, false));
        assert!(looks_like_literal(&c, true));
        // Without lit8_allowed, '~' is not consumed as part of a literal header.
        let err = parse_header(&mut c, false).unwrap_err();
        assert!(err.message.contains("{"));
    }
}
