//! `sequence-set`, `section`, and `fetch-att` parsing.

use crate::imap::command::{FetchAtt, NumRange, NumSet, Partial, SectionMsgtext, SectionPart, SectionSpec, SectionText, SetNumber};
use crate::imap::cursor::Cursor;
use crate::imap::error::{Failure, ParseError};
use crate::imap::lexical;

pub(crate) fn set_number(cursor: &mut Cursor<'_>) -> Result<SetNumber, ParseError> {
    if cursor.take(b"*") {
        return Ok(SetNumber::Star);
    }
    Ok(SetNumber::Value(lexical::nz_number(cursor)?))
}

pub(crate) fn num_range(cursor: &mut Cursor<'_>) -> Result<NumRange, ParseError> {
    let first = set_number(cursor)?;
    if cursor.take(b":") {
        let last = set_number(cursor)?;
        return Ok(NumRange { first, last: Some(last) });
    }
    Ok(NumRange { first, last: None })
}

/// `sequence-set = (seq-number / seq-range) *("," sequence-set) / "$"`
pub fn num_set(cursor: &mut Cursor<'_>) -> Result<NumSet, ParseError> {
    let _ctx = cursor.context("sequence-set");
    if cursor.take(b"$") {
        return Ok(NumSet::SearchResult);
    }
    let mut ranges = vec![num_range(cursor)?];
    while cursor.take(b",") {
        ranges.push(num_range(cursor)?);
    }
    Ok(NumSet::Ranges(ranges))
}

fn header_list(cursor: &mut Cursor<'_>) -> Result<Vec<String>, ParseError> {
    cursor.xtake(b"(")?;
    let mut names = vec![canonical_header_name(&lexical::atom(cursor)?)];
    while cursor.space() {
        names.push(canonical_header_name(&lexical::atom(cursor)?));
    }
    cursor.xtake(b")")?;
    Ok(names)
}

/// Normalize a header field name to canonical MIME casing: each
/// hyphen-separated word capitalized (`content-type` -> `Content-Type`,
/// `DKIM-Signature` -> `Dkim-Signature`). Matches the casing the rest of
/// the mail stack expects when comparing header names, regardless of how
/// the client capitalized them on the wire.
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn section_msgtext(cursor: &mut Cursor<'_>) -> Result<SectionMsgtext, ParseError> {
    if cursor.take(b"HEADER.FIELDS.NOT") {
        cursor.xspace()?;
        return Ok(SectionMsgtext::HeaderFieldsNot(header_list(cursor)?));
    }
    if cursor.take(b"HEADER.FIELDS") {
        cursor.xspace()?;
        return Ok(SectionMsgtext::HeaderFields(header_list(cursor)?));
    }
    if cursor.take(b"HEADER") {
        return Ok(SectionMsgtext::Header);
    }
    if cursor.take(b"TEXT") {
        return Ok(SectionMsgtext::Text);
    }
    Err(cursor.fail("expected HEADER / HEADER.FIELDS / HEADER.FIELDS.NOT / TEXT"))
}

fn section_part(cursor: &mut Cursor<'_>) -> Result<Vec<u32>, ParseError> {
    let mut path = vec![lexical::nz_number(cursor)?];
    while cursor.peek_at(1).is_some_and(|b| b.is_ascii_digit()) && cursor.peek() == Some(b'.') {
        cursor.xtake(b".")?;
        path.push(lexical::nz_number(cursor)?);
    }
    Ok(path)
}

/// `section-spec = section-msgtext / (section-part ["." section-text])`
pub fn section_spec(cursor: &mut Cursor<'_>) -> Result<SectionSpec, ParseError> {
    let _ctx = cursor.context("section-spec");
    if cursor.is_empty() || cursor.has_prefix(b"]") {
        return Ok(SectionSpec::Empty);
    }
    if cursor.peek().is_some_and(|b| b.is_ascii_digit()) {
        let path = section_part(cursor)?;
        let text = if cursor.take(b".") {
            Some(section_text(cursor)?)
        } else {
            None
        };
        return Ok(SectionSpec::Part(SectionPart { path, text }));
    }
    Ok(SectionSpec::Msgtext(section_msgtext(cursor)?))
}

fn section_text(cursor: &mut Cursor<'_>) -> Result<SectionText, ParseError> {
    if cursor.take(b"MIME") {
        return Ok(SectionText::Mime);
    }
    Ok(SectionText::Msgtext(section_msgtext(cursor)?))
}

/// `section = "[" [section-spec] "]"`
pub fn section(cursor: &mut Cursor<'_>) -> Result<SectionSpec, ParseError> {
    let _ctx = cursor.context("section");
    cursor.xtake(b"[")?;
    let spec = section_spec(cursor)?;
    cursor.xtake(b"]")?;
    Ok(spec)
}

/// `binary-section = "[" [section-part] "]"`
pub fn binary_section(cursor: &mut Cursor<'_>) -> Result<Vec<u32>, ParseError> {
    let _ctx = cursor.context("binary-section");
    cursor.xtake(b"[")?;
    let path = if cursor.has_prefix(b"]") {
        Vec::new()
    } else {
        section_part(cursor)?
    };
    cursor.xtake(b"]")?;
    Ok(path)
}

/// `"<" number "." nz-number ">"`
pub fn partial(cursor: &mut Cursor<'_>) -> Result<Partial, ParseError> {
    let _ctx = cursor.context("partial");
    cursor.xtake(b"<")?;
    let offset = lexical::number(cursor)?;
    cursor.xtake(b".")?;
    let count = lexical::nz_number(cursor)?;
    cursor.xtake(b">")?;
    Ok(Partial { offset, count })
}

fn maybe_partial(cursor: &mut Cursor<'_>) -> Result<Option<Partial>, ParseError> {
    if cursor.peek() == Some(b'<') {
        Ok(Some(partial(cursor)?))
    } else {
        Ok(None)
    }
}

/// One `fetch-att`, with `ALL`/`FAST`/`FULL` already excluded -- callers
/// check for those macro names before calling this.
fn fetch_att_one(cursor: &mut Cursor<'_>) -> Result<FetchAtt, ParseError> {
    let _ctx = cursor.context("fetch-att");

    if cursor.take(b"BODYSTRUCTURE") {
        return Ok(simple("BODYSTRUCTURE"));
    }
    if cursor.take(b"BODY.PEEK") {
        return body_att(cursor, true);
    }
    if cursor.take(b"BODY") {
        if cursor.peek() == Some(b'[') {
            return body_att(cursor, false);
        }
        return Ok(simple("BODY"));
    }
    if cursor.take(b"BINARY.SIZE") {
        let path = binary_section(cursor)?;
        return Ok(FetchAtt {
            field: "BINARY.SIZE".to_string(),
            peek: false,
            section: None,
            binary_section: Some(path),
            partial: None,
        });
    }
    if cursor.take(b"BINARY.PEEK") {
        let path = binary_section(cursor)?;
        let partial = maybe_partial(cursor)?;
        return Ok(FetchAtt {
            field: "BINARY".to_string(),
            peek: true,
            section: None,
            binary_section: Some(path),
            partial,
        });
    }
    if cursor.take(b"BINARY") {
        let path = binary_section(cursor)?;
        let partial = maybe_partial(cursor)?;
        return Ok(FetchAtt {
            field: "BINARY".to_string(),
            peek: false,
            section: None,
            binary_section: Some(path),
            partial,
        });
    }
    for name in ["ENVELOPE", "FLAGS", "INTERNALDATE", "RFC822.HEADER", "RFC822.SIZE", "RFC822.TEXT", "RFC822", "UID"] {
        if cursor.take(name.as_bytes()) {
            return Ok(simple(name));
        }
    }
    Err(cursor.fail("unrecognised fetch-att"))
}

fn body_att(cursor: &mut Cursor<'_>, peek: bool) -> Result<FetchAtt, ParseError> {
    let section = section(cursor)?;
    let partial = maybe_partial(cursor)?;
    Ok(FetchAtt {
        field: "BODY".to_string(),
        peek,
        section: Some(section),
        binary_section: None,
        partial,
    })
}

fn simple(field: &str) -> FetchAtt {
    FetchAtt {
        field: field.to_string(),
        peek: false,
        section: None,
        binary_section: None,
        partial: None,
    }
}

/// `fetch-att / "ALL" / "FAST" / "FULL" / "(" fetch-att *(SP fetch-att) ")"`
pub fn fetch_atts(cursor: &mut Cursor<'_>) -> Result<Vec<FetchAtt>, Failure> {
    let _ctx = cursor.context("fetch-atts");
    for name in ["ALL", "FAST", "FULL"] {
        if cursor.take(name.as_bytes()) {
            return Ok(FetchAtt::expand_macro(name).expect("macro name just matched"));
        }
    }
    if cursor.take(b"(") {
        let mut atts = Vec::new();
        if !cursor.has_prefix(b")") {
            atts.push(fetch_att_one(cursor)?);
            while cursor.space() {
                atts.push(fetch_att_one(cursor)?);
            }
        }
        cursor.xtake(b")")?;
        return Ok(atts);
    }
    Ok(vec![fetch_att_one(cursor)?])
}
