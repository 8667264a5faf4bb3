//! Lexical-level productions: numbers, atoms, strings, tags, flags.
//!
//! Anything that can contain a literal (`string`, `astring`, `nstring`) has
//! to be `async` so it can hand off to [`crate::imap::literal`]; everything
//! else here is synchronous.

use crate::imap::charset;
use crate::imap::cursor::Cursor;
use crate::imap::error::{Failure, ParseError};
use crate::imap::literal;

/// `number = 1*DIGIT`, fitting in 32 bits (message/UID numbers never need
/// more).
pub fn number(cursor: &mut Cursor<'_>) -> Result<u32, ParseError> {
    let digits = cursor.digits();
    if digits.is_empty() {
        return Err(cursor.fail("expected a number"));
    }
    std::str::from_utf8(&digits)
        .unwrap()
        .parse()
        .map_err(|_| cursor.fail("number overflows 32 bits"))
}

/// `nz-number = digit-nz *DIGIT` -- like [`number`] but zero is rejected.
pub fn nz_number(cursor: &mut Cursor<'_>) -> Result<u32, ParseError> {
    let value = number(cursor)?;
    if value == 0 {
        return Err(cursor.fail("expected a non-zero number"));
    }
    Ok(value)
}

/// `number64 = 1*DIGIT`, widened to 64 bits for literal octet counts and
/// RFC822/BINARY sizes, which can exceed `u32`.
pub fn number64(cursor: &mut Cursor<'_>) -> Result<u64, ParseError> {
    let digits = cursor.digits();
    if digits.is_empty() {
        return Err(cursor.fail("expected a number"));
    }
    std::str::from_utf8(&digits)
        .unwrap()
        .parse()
        .map_err(|_| cursor.fail("number overflows 64 bits"))
}

/// `atom = 1*ATOM-CHAR`
pub fn atom(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let bytes = cursor.take_while_original(charset::is_atom_char);
    if bytes.is_empty() {
        return Err(cursor.fail("expected an atom"));
    }
    Ok(String::from_utf8(bytes).expect("ATOM-CHAR is always valid ASCII"))
}

/// `tag = 1*<any ASTRING-CHAR except "+">`
pub fn tag(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let bytes = cursor.take_while_original(|b| charset::is_astring_char(b) && b != b'+');
    if bytes.is_empty() {
        return Err(cursor.fail("expected a tag"));
    }
    Ok(String::from_utf8(bytes).expect("ASTRING-CHAR is always valid ASCII"))
}

/// `quoted = DQUOTE *QUOTED-CHAR DQUOTE`, synchronous -- a quoted string
/// can never contain a literal.
pub fn quoted(cursor: &mut Cursor<'_>) -> Result<Vec<u8>, ParseError> {
    let _ctx = cursor.context("quoted");
    cursor.xtake(b"\"")?;
    let mut out = Vec::new();
    loop {
        match cursor.peek_original() {
            None => return Err(cursor.fail("unterminated quoted string")),
            Some(b'"') => {
                cursor.taken(1)?;
                break;
            }
            Some(b'\\') => {
                cursor.taken(1)?;
                match cursor.peek_original() {
                    Some(b @ (b'"' | b'\\')) => {
                        cursor.taken(1)?;
                        out.push(b);
                    }
                    _ => return Err(cursor.fail("invalid escape in quoted string")),
                }
            }
            Some(b) if b == b'\r' || b == b'\n' => {
                return Err(cursor.fail("CR/LF not allowed in quoted string"))
            }
            Some(b) => {
                cursor.taken(1)?;
                out.push(b);
            }
        }
    }
    Ok(out)
}

/// `string = quoted / literal`
pub async fn string(
    cursor: &mut Cursor<'_>,
    lit8_allowed: bool,
    max_literal: u64,
) -> Result<Vec<u8>, Failure> {
    let _ctx = cursor.context("string");
    if cursor.peek_original() == Some(b'"') {
        return Ok(quoted(cursor)?);
    }
    if literal::looks_like_literal(cursor, lit8_allowed) {
        return literal::read_literal(cursor, lit8_allowed, max_literal).await;
    }
    Err(Failure::Syntax(cursor.fail("expected a quoted string or literal")))
}

/// `astring = 1*ASTRING-CHAR / string`
pub async fn astring(
    cursor: &mut Cursor<'_>,
    lit8_allowed: bool,
    max_literal: u64,
) -> Result<Vec<u8>, Failure> {
    let _ctx = cursor.context("astring");
    if cursor.peek_original() == Some(b'"') || literal::looks_like_literal(cursor, lit8_allowed) {
        return string(cursor, lit8_allowed, max_literal).await;
    }
    let bytes = cursor.take_while_original(charset::is_astring_char);
    if bytes.is_empty() {
        return Err(Failure::Syntax(cursor.fail("expected an astring")));
    }
    Ok(bytes)
}

/// `astring` narrowed to valid UTF-8, for contexts (usernames, mechanism
/// names) where the caller wants a `String` rather than raw bytes.
pub async fn astring_utf8(
    cursor: &mut Cursor<'_>,
    lit8_allowed: bool,
    max_literal: u64,
) -> Result<String, Failure> {
    let bytes = astring(cursor, lit8_allowed, max_literal).await?;
    String::from_utf8(bytes).map_err(|_| Failure::Syntax(cursor.fail("expected UTF-8 astring")))
}

/// `nstring = string / nil` -- note there is no bare-atom alternative here,
/// unlike `astring`, so matching the literal text `NIL` is unambiguous.
pub async fn nstring(
    cursor: &mut Cursor<'_>,
    lit8_allowed: bool,
    max_literal: u64,
) -> Result<Option<Vec<u8>>, Failure> {
    if cursor.has_prefix(b"NIL") {
        let next_is_atom_char = cursor
            .remaining_original()
            .get(3)
            .is_some_and(|&b| charset::is_atom_char(b));
        if !next_is_atom_char {
            cursor.take(b"NIL");
            return Ok(None);
        }
    }
    Ok(Some(string(cursor, lit8_allowed, max_literal).await?))
}

const SYSTEM_FLAGS: &[(&str, &str)] = &[
    ("ANSWERED", "\\Answered"),
    ("FLAGGED", "\\Flagged"),
    ("DELETED", "\\Deleted"),
    ("SEEN", "\\Seen"),
    ("DRAFT", "\\Draft"),
];

/// `flag = "\Answered" / "\Flagged" / "\Deleted" / "\Seen" / "\Draft" /
///         flag-keyword / flag-extension`
///
/// Returns the flag normalized to its canonical spelling, so `seen`,
/// `Seen` and `SEEN` all come back as `"\Seen"`.
pub fn flag(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let _ctx = cursor.context("flag");
    if cursor.take(b"\\") {
        let name = atom(cursor)?;
        let upper = name.to_ascii_uppercase();
        return SYSTEM_FLAGS
            .iter()
            .find(|(known, _)| *known == upper)
            .map(|(_, canonical)| canonical.to_string())
            .ok_or_else(|| cursor.fail(format!("unknown system flag \\{name}")));
    }
    if cursor.take(b"$") {
        let keyword = atom(cursor)?;
        return Ok(format!("${keyword}"));
    }
    atom(cursor)
}

/// `command = 1*<A-Z>`, with the one special case the grammar carves out:
/// `UID` followed by a space and another run of letters is folded into a
/// single two-word command name (`"UID FETCH"`, `"UID SEARCH"`, ...)
/// rather than leaving the dispatcher to notice `UID` and recurse.
pub fn command_name(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let _ctx = cursor.context("command");
    let first = cursor.take_while_original(|b| b.is_ascii_alphabetic());
    if first.is_empty() {
        return Err(cursor.fail("expected a command name"));
    }
    let mut name = String::from_utf8(first)
        .expect("ASCII letters are always valid UTF-8")
        .to_ascii_uppercase();
    let followed_by_word = cursor.peek() == Some(b' ')
        && cursor.peek_at(1).is_some_and(|b| b.is_ascii_alphabetic());
    if name == "UID" && followed_by_word {
        cursor.take(b" ");
        let second = cursor.take_while_original(|b| b.is_ascii_alphabetic());
        name.push(' ');
        name.push_str(
            &String::from_utf8(second)
                .expect("ASCII letters are always valid UTF-8")
                .to_ascii_uppercase(),
        );
    }
    Ok(name)
}

/// `flag-list = "(" [flag *(SP flag)] ")"`
pub fn flag_list(cursor: &mut Cursor<'_>) -> Result<Vec<String>, ParseError> {
    let _ctx = cursor.context("flag-list");
    cursor.xtake(b"(")?;
    let mut flags = Vec::new();
    if !cursor.has_prefix(b")") {
        flags.push(flag(cursor)?);
        while cursor.space() {
            flags.push(flag(cursor)?);
        }
    }
    cursor.xtake(b")")?;
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imap::transport::test_support::ScriptedTransport;
    use pretty_assertions::assert_eq;

    fn cursor(line: &str, transport: &mut ScriptedTransport) -> Cursor<'_> {
        Cursor::new(line.to_string(), transport)
    }

    #[test]
    fn number_rejects_empty_and_overflow() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("", &mut t);
        assert!(number(&mut c).is_err());
        let mut c = cursor("99999999999999999999", &mut t);
        assert!(number(&mut c).is_err());
    }

    #[test]
    fn nz_number_rejects_zero() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("0", &mut t);
        assert!(nz_number(&mut c).is_err());
    }

    #[test]
    fn quoted_handles_escapes() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor(r#""a\"b\\c""#, &mut t);
        assert_eq!(quoted(&mut c).unwrap(), br#"a"b\c"#.to_vec());
    }

    #[test]
    fn quoted_rejects_cr() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("\"a\rb\"", &mut t);
        assert!(quoted(&mut c).is_err());
    }

    #[tokio::test]
    async fn astring_prefers_bare_atom_over_quoting() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("INBOX more", &mut t);
        let s = astring(&mut c, false, 0).await.unwrap();
        assert_eq!(s, b"INBOX");
    }

    #[tokio::test]
    async fn nstring_parses_nil_case_insensitively() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("nil", &mut t);
        assert_eq!(nstring(&mut c, false, 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn nstring_does_not_mistake_nil_prefixed_atom() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("\"NILFOO\"", &mut t);
        assert_eq!(
            nstring(&mut c, false, 0).await.unwrap(),
            Some(b"NILFOO".to_vec())
        );
    }

    #[test]
    fn flag_normalises_known_system_flags_case_insensitively() {
        for text in ["\\Seen", "\\seen", "\\SEEN"] {
            let mut t = ScriptedTransport::new(vec![]);
            let mut c = cursor(text, &mut t);
            assert_eq!(flag(&mut c).unwrap(), "\\Seen");
        }
    }

    #[test]
    fn flag_rejects_unknown_system_flag() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("\\Recent", &mut t);
        assert!(flag(&mut c).is_err());
    }

    #[test]
    fn command_name_is_upper_cased() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("login foo", &mut t);
        assert_eq!(command_name(&mut c).unwrap(), "LOGIN");
        assert_eq!(c.remaining_original(), b" foo");
    }

    #[test]
    fn uid_folds_in_the_subcommand() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("uid fetch 1:* FLAGS", &mut t);
        assert_eq!(command_name(&mut c).unwrap(), "UID FETCH");
        assert_eq!(c.remaining_original(), b" 1:* FLAGS");
    }

    #[test]
    fn uid_alone_stays_a_single_word() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("UID\r\n", &mut t);
        assert_eq!(command_name(&mut c).unwrap(), "UID");
    }

    #[test]
    fn flag_list_parses_space_separated_flags() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("(\\Seen \\Deleted foo)", &mut t);
        assert_eq!(
            flag_list(&mut c).unwrap(),
            vec!["\\Seen".to_string(), "\\Deleted".to_string(), "foo".to_string()]
        );
    }
}
