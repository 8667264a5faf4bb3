//! `search-key` parsing.
//!
//! `search-key` is recursive (`OR key key`, `NOT key`, and a parenthesized
//! group are all keys built out of other keys), and keys can themselves
//! contain astrings that may be literals. A literal read means awaiting
//! the transport, so `search_key` has to be `async fn` -- and an `async
//! fn` that calls itself doesn't compile, because the compiler would need
//! an infinitely-sized future to represent the call stack. The fix is the
//! same one `async-trait` applies under the hood: box the recursive call's
//! future so its size is known (one pointer) regardless of how deep the
//! recursion goes.

use std::future::Future;
use std::pin::Pin;

use crate::imap::command::{NumSet, SearchKey};
use crate::imap::cursor::Cursor;
use crate::imap::datetime;
use crate::imap::error::Failure;
use crate::imap::lexical;
use crate::imap::section::num_set;

type BoxedParse<'a, T> = Pin<Box<dyn Future<Output = Result<T, Failure>> + Send + 'a>>;

fn astring_arg<'a>(cursor: &'a mut Cursor<'_>, lit8_allowed: bool, max_literal: u64) -> BoxedParse<'a, String> {
    Box::pin(lexical::astring_utf8(cursor, lit8_allowed, max_literal))
}

/// `search-key *(SP search-key)`, wrapped in `[ ... ]` by the caller when
/// used as a parenthesized group.
pub fn search_key<'a>(
    cursor: &'a mut Cursor<'_>,
    lit8_allowed: bool,
    max_literal: u64,
) -> BoxedParse<'a, SearchKey> {
    Box::pin(async move {
        let _ctx = cursor.context("search-key");

        if cursor.take(b"(") {
            let mut keys = vec![search_key(cursor, lit8_allowed, max_literal).await?];
            while cursor.space() {
                keys.push(search_key(cursor, lit8_allowed, max_literal).await?);
            }
            cursor.xtake(b")").map_err(Failure::Syntax)?;
            return Ok(if keys.len() == 1 {
                keys.into_iter().next().unwrap()
            } else {
                SearchKey::Group(keys)
            });
        }

        if cursor.take(b"OR") {
            cursor.xspace().map_err(Failure::Syntax)?;
            let a = search_key(cursor, lit8_allowed, max_literal).await?;
            cursor.xspace().map_err(Failure::Syntax)?;
            let b = search_key(cursor, lit8_allowed, max_literal).await?;
            return Ok(SearchKey::Or(Box::new(a), Box::new(b)));
        }
        if cursor.take(b"NOT") {
            cursor.xspace().map_err(Failure::Syntax)?;
            let k = search_key(cursor, lit8_allowed, max_literal).await?;
            return Ok(SearchKey::Not(Box::new(k)));
        }
        if cursor.take(b"UID") {
            cursor.xspace().map_err(Failure::Syntax)?;
            let set = num_set(cursor).map_err(Failure::Syntax)?;
            return Ok(SearchKey::Uid(set));
        }

        // The fixed-keyword, no-argument keys. Longest-name-first matters
        // here too: UNANSWERED before ANSWERED would never fire since
        // ANSWERED doesn't prefix UNANSWERED, but UNSEEN/UNDRAFT etc. do
        // share a prefix with their un-negated counterpart in the other
        // direction, so every "UN*" form is tried before its base form.
        macro_rules! atomic {
            ($text:expr, $key:expr) => {
                if cursor.take($text) {
                    return Ok($key);
                }
            };
        }
        atomic!(b"ALL", SearchKey::All);
        atomic!(b"UNANSWERED", SearchKey::Unanswered);
        atomic!(b"ANSWERED", SearchKey::Answered);
        atomic!(b"UNDELETED", SearchKey::Undeleted);
        atomic!(b"DELETED", SearchKey::Deleted);
        atomic!(b"UNFLAGGED", SearchKey::Unflagged);
        atomic!(b"FLAGGED", SearchKey::Flagged);
        atomic!(b"NEW", SearchKey::New);
        atomic!(b"OLD", SearchKey::Old);
        atomic!(b"RECENT", SearchKey::Recent);
        atomic!(b"UNSEEN", SearchKey::Unseen);
        atomic!(b"SEEN", SearchKey::Seen);
        atomic!(b"UNDRAFT", SearchKey::Undraft);
        atomic!(b"DRAFT", SearchKey::Draft);

        if cursor.take(b"BCC") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::Bcc(astring_arg(cursor, lit8_allowed, max_literal).await?));
        }
        if cursor.take(b"BODY") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::Body(astring_arg(cursor, lit8_allowed, max_literal).await?));
        }
        if cursor.take(b"CC") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::Cc(astring_arg(cursor, lit8_allowed, max_literal).await?));
        }
        if cursor.take(b"FROM") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::From(astring_arg(cursor, lit8_allowed, max_literal).await?));
        }
        if cursor.take(b"SUBJECT") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::Subject(astring_arg(cursor, lit8_allowed, max_literal).await?));
        }
        if cursor.take(b"TEXT") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::Text(astring_arg(cursor, lit8_allowed, max_literal).await?));
        }
        if cursor.take(b"TO") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::To(astring_arg(cursor, lit8_allowed, max_literal).await?));
        }
        if cursor.take(b"KEYWORD") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::Keyword(lexical::atom(cursor).map_err(Failure::Syntax)?));
        }
        if cursor.take(b"UNKEYWORD") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::Unkeyword(lexical::atom(cursor).map_err(Failure::Syntax)?));
        }
        if cursor.take(b"HEADER") {
            cursor.xspace().map_err(Failure::Syntax)?;
            let field = lexical::astring_utf8(cursor, lit8_allowed, max_literal).await?;
            cursor.xspace().map_err(Failure::Syntax)?;
            let value = lexical::astring_utf8(cursor, lit8_allowed, max_literal).await?;
            return Ok(SearchKey::Header(field, value));
        }
        if cursor.take(b"SENTBEFORE") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::SentBefore(datetime::date(cursor).map_err(Failure::Syntax)?));
        }
        if cursor.take(b"SENTON") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::SentOn(datetime::date(cursor).map_err(Failure::Syntax)?));
        }
        if cursor.take(b"SENTSINCE") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::SentSince(datetime::date(cursor).map_err(Failure::Syntax)?));
        }
        if cursor.take(b"BEFORE") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::Before(datetime::date(cursor).map_err(Failure::Syntax)?));
        }
        if cursor.take(b"ON") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::On(datetime::date(cursor).map_err(Failure::Syntax)?));
        }
        if cursor.take(b"SINCE") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::Since(datetime::date(cursor).map_err(Failure::Syntax)?));
        }
        if cursor.take(b"LARGER") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::Larger(lexical::number64(cursor).map_err(Failure::Syntax)?));
        }
        if cursor.take(b"SMALLER") {
            cursor.xspace().map_err(Failure::Syntax)?;
            return Ok(SearchKey::Smaller(lexical::number64(cursor).map_err(Failure::Syntax)?));
        }

        // Anything left that starts with a digit or "*" is a bare
        // sequence-set search key.
        if cursor.peek().is_some_and(|b| b.is_ascii_digit() || b == b'*' || b == b'$') {
            return Ok(SearchKey::SeqSet(num_set(cursor).map_err(Failure::Syntax)?));
        }

        Err(Failure::Syntax(cursor.fail("unrecognised search-key")))
    })
}

/// Parses the implicit-AND `search-key *(SP search-key)` sequence that
/// follows the optional `[CHARSET]` prefix -- that prefix is consumed by
/// the caller ([`crate::imap::parser::parse_search`]) before this is
/// reached. Flattens a bare top-level list into a [`SearchKey::Group`].
pub async fn search_program<'a>(
    cursor: &'a mut Cursor<'_>,
    lit8_allowed: bool,
    max_literal: u64,
) -> Result<SearchKey, Failure> {
    let mut keys = vec![search_key(cursor, lit8_allowed, max_literal).await?];
    while cursor.space() {
        keys.push(search_key(cursor, lit8_allowed, max_literal).await?);
    }
    Ok(if keys.len() == 1 {
        keys.into_iter().next().unwrap()
    } else {
        SearchKey::Group(keys)
    })
}
