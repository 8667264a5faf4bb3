//! `tagged-ext-label` / `tagged-ext-val` / `tagged-ext-simple` /
//! `tagged-ext-comp`: the generic grammar RFC 4466 introduced so later
//! extensions could add `label value` pairs to existing commands without
//! a new grammar production per extension.
//!
//! The parser accepts these productions wherever the base grammar calls
//! for them, but -- per this server's scope -- doesn't interpret the
//! values: they're parsed just well enough to be skipped cleanly, so an
//! unrecognised extension parameter doesn't corrupt the parse of whatever
//! follows it on the line.

use std::future::Future;
use std::pin::Pin;

use crate::imap::command::{NumSet, SetNumber, TaggedExtVal};
use crate::imap::cursor::Cursor;
use crate::imap::error::{Failure, ParseError};
use crate::imap::lexical;
use crate::imap::section::{num_range, num_set, set_number};

type BoxedParse<'a, T> = Pin<Box<dyn Future<Output = Result<T, Failure>> + Send + 'a>>;

fn upper(b: u8) -> u8 {
    if b.is_ascii_lowercase() {
        b - 0x20
    } else {
        b
    }
}

fn is_label_start(b: u8) -> bool {
    matches!(upper(b), b'A'..=b'Z' | b'_' | b'.' | b'-')
}

fn is_label_cont(b: u8) -> bool {
    is_label_start(b) || b.is_ascii_digit() || b == b':'
}

/// `tagged-ext-label = tagged-label-fchar *tagged-label-char`
pub fn tagged_ext_label(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let _ctx = cursor.context("tagged-ext-label");
    if !cursor.peek_original().is_some_and(is_label_start) {
        return Err(cursor.fail("expected a tagged extension label"));
    }
    let bytes = cursor.take_while_original(is_label_cont);
    Ok(String::from_utf8(bytes).expect("label chars are ASCII"))
}

/// `tagged-ext-simple = sequence-set / number`, generalised: a digit run
/// optionally continuing as a `seq-range` and further comma-separated
/// ranges, or (if no digits are present) a full `sequence-set`.
///
/// Per an upstream ambiguity in the grammar this was distilled from: the
/// "no initial digits" branch must parse a complete `numSet` and return
/// immediately, rather than falling through to try a second numeric parse
/// afterwards (which could never succeed, since `numSet` would already
/// have consumed any digits present).
fn tagged_ext_simple(cursor: &mut Cursor<'_>) -> Result<TaggedExtVal, ParseError> {
    let _ctx = cursor.context("tagged-ext-simple");
    let digits = cursor.digits();
    if digits.is_empty() {
        return Ok(TaggedExtVal::NumSet(num_set(cursor)?));
    }
    let first: u32 = std::str::from_utf8(&digits)
        .unwrap()
        .parse()
        .map_err(|_| cursor.fail("number overflows 32 bits"))?;
    let mut ranges = vec![continue_range(cursor, first)?];
    while cursor.take(b",") {
        ranges.push(num_range(cursor)?);
    }
    Ok(TaggedExtVal::NumSet(NumSet::Ranges(ranges)))
}

fn continue_range(
    cursor: &mut Cursor<'_>,
    first: u32,
) -> Result<crate::imap::command::NumRange, ParseError> {
    use crate::imap::command::NumRange;
    if cursor.take(b":") {
        let last = if cursor.take(b"*") {
            SetNumber::Star
        } else {
            set_number(cursor)?
        };
        return Ok(NumRange { first: SetNumber::Value(first), last: Some(last) });
    }
    Ok(NumRange { first: SetNumber::Value(first), last: None })
}

/// `tagged-ext-comp = astring / tagged-ext-comp *(SP tagged-ext-comp) / "(" tagged-ext-comp ")"`
///
/// Recursive and may contain literals (via `astring`), so -- like
/// [`crate::imap::search::search_key`] -- the recursive call has to be
/// boxed to keep the future's size finite.
pub fn tagged_ext_comp<'a>(
    cursor: &'a mut Cursor<'_>,
    lit8_allowed: bool,
    max_literal: u64,
) -> BoxedParse<'a, TaggedExtVal> {
    Box::pin(async move {
        let _ctx = cursor.context("tagged-ext-comp");
        if cursor.take(b"(") {
            let mut items = Vec::new();
            if !cursor.has_prefix(b")") {
                items.push(tagged_ext_comp(cursor, lit8_allowed, max_literal).await?);
                while cursor.space() {
                    items.push(tagged_ext_comp(cursor, lit8_allowed, max_literal).await?);
                }
            }
            cursor.xtake(b")").map_err(Failure::Syntax)?;
            return Ok(TaggedExtVal::Comp(items));
        }
        let first = lexical::astring_utf8(cursor, lit8_allowed, max_literal).await?;
        let mut items = vec![TaggedExtVal::Simple(first)];
        while cursor.space() {
            items.push(tagged_ext_comp(cursor, lit8_allowed, max_literal).await?);
        }
        Ok(if items.len() == 1 {
            items.into_iter().next().unwrap()
        } else {
            TaggedExtVal::Comp(items)
        })
    })
}

/// `tagged-ext-val = "(" [tagged-ext-comp] ")" / tagged-ext-simple`
pub fn tagged_ext_val<'a>(
    cursor: &'a mut Cursor<'_>,
    lit8_allowed: bool,
    max_literal: u64,
) -> BoxedParse<'a, TaggedExtVal> {
    Box::pin(async move {
        let _ctx = cursor.context("tagged-ext-val");
        if cursor.take(b"(") {
            if cursor.take(b")") {
                return Ok(TaggedExtVal::Comp(Vec::new()));
            }
            let inner = tagged_ext_comp(cursor, lit8_allowed, max_literal).await?;
            cursor.xtake(b")").map_err(Failure::Syntax)?;
            return Ok(inner);
        }
        tagged_ext_simple(cursor).map_err(Failure::Syntax)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imap::command::NumRange;
    use crate::imap::transport::test_support::ScriptedTransport;
    use pretty_assertions::assert_eq;

    fn cursor(line: &str, transport: &mut ScriptedTransport) -> Cursor<'_> {
        Cursor::new(line.to_string(), transport)
    }

    #[test]
    fn label_allows_dots_and_underscores_and_colons_after_the_first_char() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("X-FOO.BAR_1:2 rest", &mut t);
        assert_eq!(tagged_ext_label(&mut c).unwrap(), "X-FOO.BAR_1:2");
    }

    #[test]
    fn label_rejects_leading_digit() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("1ABC", &mut t);
        assert!(tagged_ext_label(&mut c).is_err());
    }

    #[tokio::test]
    async fn empty_parens_are_accepted() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("()", &mut t);
        assert_eq!(
            tagged_ext_val(&mut c, false, 0).await.unwrap(),
            TaggedExtVal::Comp(vec![])
        );
    }

    #[tokio::test]
    async fn simple_digit_run_continues_as_a_sequence_range() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("5:10,20", &mut t);
        let val = tagged_ext_val(&mut c, false, 0).await.unwrap();
        assert_eq!(
            val,
            TaggedExtVal::NumSet(NumSet::Ranges(vec![
                NumRange { first: SetNumber::Value(5), last: Some(SetNumber::Value(10)) },
                NumRange { first: SetNumber::Value(20), last: None },
            ]))
        );
    }

    #[tokio::test]
    async fn no_digits_falls_back_to_full_num_set() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("$", &mut t);
        let val = tagged_ext_val(&mut c, false, 0).await.unwrap();
        assert_eq!(val, TaggedExtVal::NumSet(NumSet::SearchResult));
    }

    #[tokio::test]
    async fn comp_collects_space_separated_astrings() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("(foo bar baz)", &mut t);
        let val = tagged_ext_val(&mut c, false, 0).await.unwrap();
        assert_eq!(
            val,
            TaggedExtVal::Comp(vec![
                TaggedExtVal::Simple("foo".into()),
                TaggedExtVal::Simple("bar".into()),
                TaggedExtVal::Simple("baz".into()),
            ])
        );
    }
}
