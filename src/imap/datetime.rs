//! `date` / `date-time` / `zone` grammar.
//!
//! These are synchronous productions -- no literal can appear inside a
//! date -- so unlike most of the rest of the parser they don't need to be
//! async.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::imap::cursor::Cursor;
use crate::imap::error::ParseError;

const MONTHS: [&[u8]; 12] = [
    b"JAN", b"FEB", b"MAR", b"APR", b"MAY", b"JUN", b"JUL", b"AUG", b"SEP", b"OCT", b"NOV", b"DEC",
];

/// `date-day = 1*2DIGIT`
pub fn date_day(cursor: &mut Cursor<'_>) -> Result<u32, ParseError> {
    let digits = cursor.digits();
    if digits.is_empty() || digits.len() > 2 {
        return Err(cursor.fail("expected 1-2 digit day"));
    }
    Ok(std::str::from_utf8(&digits).unwrap().parse().unwrap())
}

/// `date-day-fixed = (SP DIGIT) / 2DIGIT` -- always two columns wide, a
/// leading space standing in for a leading zero on single-digit days.
pub fn date_day_fixed(cursor: &mut Cursor<'_>) -> Result<u32, ParseError> {
    let bytes = cursor.taken(2)?;
    let valid = match bytes[0] {
        b' ' => bytes[1].is_ascii_digit(),
        a => a.is_ascii_digit() && bytes[1].is_ascii_digit(),
    };
    if !valid {
        return Err(cursor.fail("expected a fixed-width day"));
    }
    let text = std::str::from_utf8(&bytes).unwrap().trim_start();
    text.parse().map_err(|_| cursor.fail("invalid date-day-fixed"))
}

/// `date-month = "Jan" / "Feb" / ... / "Dec"` -- matched case-insensitively
/// against the cursor's upper-cased view; returns 1-12.
pub fn date_month(cursor: &mut Cursor<'_>) -> Result<u32, ParseError> {
    for (idx, name) in MONTHS.iter().enumerate() {
        if cursor.take(name) {
            return Ok(idx as u32 + 1);
        }
    }
    Err(cursor.fail("expected a three-letter month name"))
}

/// `time = 2DIGIT ":" 2DIGIT ":" 2DIGIT`
pub fn time(cursor: &mut Cursor<'_>) -> Result<(u32, u32, u32), ParseError> {
    let h = two_digit(cursor)?;
    cursor.xtake(b":")?;
    let m = two_digit(cursor)?;
    cursor.xtake(b":")?;
    let s = two_digit(cursor)?;
    Ok((h, m, s))
}

fn two_digit(cursor: &mut Cursor<'_>) -> Result<u32, ParseError> {
    let bytes = cursor.taken(2)?;
    if !bytes.iter().all(u8::is_ascii_digit) {
        return Err(cursor.fail("expected two digits"));
    }
    Ok(std::str::from_utf8(&bytes).unwrap().parse().unwrap())
}

/// A parsed time zone offset, keeping the original `sign digit{4}` text
/// around for anything that needs to echo it back verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub offset: FixedOffset,
    pub raw: String,
}

/// `zone = ("+" / "-") 4DIGIT`
pub fn zone(cursor: &mut Cursor<'_>) -> Result<Zone, ParseError> {
    let sign = if cursor.take(b"+") {
        1
    } else if cursor.take(b"-") {
        -1
    } else {
        return Err(cursor.fail("expected zone sign"));
    };
    let digits = cursor.taken(4)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(cursor.fail("expected 4-digit zone offset"));
    }
    let text = std::str::from_utf8(&digits).unwrap();
    let hours: i32 = text[0..2].parse().unwrap();
    let minutes: i32 = text[2..4].parse().unwrap();
    let seconds = sign * (hours * 3600 + minutes * 60);
    let offset = FixedOffset::east_opt(seconds).ok_or_else(|| cursor.fail("zone offset out of range"))?;
    let raw = format!("{}{}", if sign < 0 { "-" } else { "+" }, text);
    Ok(Zone { offset, raw })
}

/// `date = date-text / DQUOTE date-text DQUOTE`
/// `date-text = date-day "-" date-month "-" date-year`
///
/// Open question resolved here: the original grammar is asymmetric about
/// quoting (nothing requires a matching closing quote if a leading one was
/// present). We keep that permissiveness -- an opening quote is consumed
/// if present, a closing quote is consumed if present, but its absence is
/// not an error -- rather than tightening the grammar, since SEARCH dates
/// seen in the wild mix both forms and rejecting one would be a
/// regression for existing clients.
pub fn date(cursor: &mut Cursor<'_>) -> Result<DateTime<Utc>, ParseError> {
    let _ctx = cursor.context("date");
    let quoted = cursor.take(b"\"");
    let day = date_day(cursor)?;
    cursor.xtake(b"-")?;
    let month = date_month(cursor)?;
    cursor.xtake(b"-")?;
    let year = four_digit_year(cursor)?;
    if quoted {
        cursor.take(b"\"");
    }
    let naive = NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| cursor.fail("invalid calendar date"))?;
    Ok(Utc.from_utc_datetime(&naive.and_hms_opt(0, 0, 0).unwrap()))
}

fn four_digit_year(cursor: &mut Cursor<'_>) -> Result<u32, ParseError> {
    let digits = cursor.taken(4)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(cursor.fail("expected 4-digit year"));
    }
    Ok(std::str::from_utf8(&digits).unwrap().parse().unwrap())
}

/// `date-time = DQUOTE date-day-fixed "-" date-month "-" date-year SP time SP zone DQUOTE`
pub fn date_time(cursor: &mut Cursor<'_>) -> Result<DateTime<FixedOffset>, ParseError> {
    let _ctx = cursor.context("date-time");
    cursor.xtake(b"\"")?;
    let day = date_day_fixed(cursor)?;
    cursor.xtake(b"-")?;
    let month = date_month(cursor)?;
    cursor.xtake(b"-")?;
    let year = four_digit_year(cursor)?;
    cursor.xspace()?;
    let (h, m, s) = time(cursor)?;
    cursor.xspace()?;
    let zone = zone(cursor)?;
    cursor.xtake(b"\"")?;

    let naive = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|d| d.and_hms_opt(h, m, s))
        .ok_or_else(|| cursor.fail("invalid date-time"))?;
    zone.offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| cursor.fail("ambiguous local date-time for zone"))
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
    fn parses_unquoted_search_date() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("1-Feb-1994", &mut t);
        let d = date(&mut c).unwrap();
        assert_eq!(d.format("%Y-%m-%d").to_string(), "1994-02-01");
    }

    #[test]
    fn accepts_opening_quote_without_closing_quote() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("\"1-Feb-1994", &mut t);
        let d = date(&mut c).unwrap();
        assert_eq!(d.format("%Y-%m-%d").to_string(), "1994-02-01");
        assert!(c.is_empty());
    }

    #[test]
    fn parses_full_date_time_with_zone() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("\" 1-Jul-2002 15:30:00 +0200\"", &mut t);
        let dt = date_time(&mut c).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S %z").to_string(), "2002-07-01 15:30:00 +0200");
    }

    #[test]
    fn month_match_is_case_insensitive() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("jUL", &mut t);
        assert_eq!(date_month(&mut c).unwrap(), 7);
    }

    #[test]
    fn rejects_invalid_calendar_date() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = cursor("31-Feb-1994", &mut t);
        assert!(date(&mut c).is_err());
    }
}
