//! `status-att` parsing for the `STATUS` command.

use crate::imap::command::StatusAtt;
use crate::imap::cursor::Cursor;
use crate::imap::error::ParseError;

/// `status-att = "MESSAGES" / "UIDNEXT" / "UIDVALIDITY" / "UNSEEN" /
///               "DELETED" / "SIZE" / "RECENT" / "APPENDLIMIT"`
///
/// `HIGHESTMODSEQ` is accepted too -- see [`StatusAtt::HighestModSeq`].
/// Longest match first: nothing here actually prefixes another entry, but
/// the order is kept alphabetically unsurprising rather than leaning on
/// that.
pub fn status_att(cursor: &mut Cursor<'_>) -> Result<StatusAtt, ParseError> {
    let _ctx = cursor.context("status-att");
    const ATTS: &[(&[u8], StatusAtt)] = &[
        (b"MESSAGES", StatusAtt::Messages),
        (b"UIDNEXT", StatusAtt::UidNext),
        (b"UIDVALIDITY", StatusAtt::UidValidity),
        (b"UNSEEN", StatusAtt::Unseen),
        (b"DELETED", StatusAtt::Deleted),
        (b"SIZE", StatusAtt::Size),
        (b"RECENT", StatusAtt::Recent),
        (b"APPENDLIMIT", StatusAtt::AppendLimit),
        (b"HIGHESTMODSEQ", StatusAtt::HighestModSeq),
    ];
    for (name, att) in ATTS {
        if cursor.take(name) {
            return Ok(*att);
        }
    }
    Err(cursor.fail("expected a status-att"))
}

/// `status-att-list = status-att *(SP status-att)`, parenthesized by the
/// caller (the `STATUS` command's own grammar wraps it in `"(" ... ")"`).
pub fn status_att_list(cursor: &mut Cursor<'_>) -> Result<Vec<StatusAtt>, ParseError> {
    let _ctx = cursor.context("status-att-list");
    cursor.xtake(b"(")?;
    let mut atts = Vec::new();
    if !cursor.has_prefix(b")") {
        atts.push(status_att(cursor)?);
        while cursor.space() {
            atts.push(status_att(cursor)?);
        }
    }
    cursor.xtake(b")")?;
    Ok(atts)
}
