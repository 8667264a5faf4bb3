//! The parser's read head: a position into a command line, threaded
//! through every grammar production instead of a byte slice.
//!
//! Two byte buffers are kept in lock-step: `original`, exactly what the
//! client sent, and `upper`, the same bytes ASCII-upper-folded. Keywords
//! and command names are matched case-insensitively against `upper`;
//! anything that must preserve the client's casing (mailbox names, quoted
//! string bodies, literal payloads) is read out of `original` at the same
//! offset. The two buffers are always the same length, so an offset valid
//! in one is valid in the other -- that's the invariant the rest of the
//! parser leans on instead of re-deriving it at every call site.

use crate::imap::charset;
use crate::imap::error::ParseError;
use crate::imap::transport::Transport;

const PREVIEW_LEN: usize = 48;

pub struct Cursor<'t> {
    original: Vec<u8>,
    upper: Vec<u8>,
    offset: usize,
    context: Vec<&'static str>,
    transport: &'t mut dyn Transport,
}

impl<'t> Cursor<'t> {
    pub fn new(line: String, transport: &'t mut dyn Transport) -> Self {
        let original = line.into_bytes();
        let upper = charset::upcase_ascii(&original);
        Self {
            original,
            upper,
            offset: 0,
            context: Vec::new(),
            transport,
        }
    }

    /// Replace the buffered line and reset to offset zero, keeping the
    /// context stack and transport handle. Used after a literal is read:
    /// the remainder of the command line arrives as a fresh line from the
    /// transport and parsing continues from its start.
    pub fn rebind(&mut self, line: String) {
        self.original = line.into_bytes();
        self.upper = charset::upcase_ascii(&self.original);
        self.offset = 0;
    }

    pub fn transport(&mut self) -> &mut dyn Transport {
        self.transport
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.upper.len()
    }

    /// Length, in bytes, of the line currently buffered (not the whole
    /// command -- after a literal rebinds the cursor, this is just the
    /// length of the fragment that followed the literal).
    pub fn line_len(&self) -> usize {
        self.original.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.upper.get(self.offset).copied()
    }

    pub fn peek_original(&self) -> Option<u8> {
        self.original.get(self.offset).copied()
    }

    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.upper.get(self.offset + ahead).copied()
    }

    fn remaining_upper(&self) -> &[u8] {
        &self.upper[self.offset..]
    }

    pub fn remaining_original(&self) -> &[u8] {
        &self.original[self.offset..]
    }

    /// True if the unconsumed input starts with `needle` (already
    /// upper-cased by the caller). Does not advance.
    pub fn has_prefix(&self, needle: &[u8]) -> bool {
        self.remaining_upper().starts_with(needle)
    }

    /// Consume `needle` (case-insensitively) if present. Leaves the cursor
    /// untouched and returns `false` on mismatch, never partially advances.
    pub fn take(&mut self, needle: &[u8]) -> bool {
        if self.has_prefix(needle) {
            self.offset += needle.len();
            true
        } else {
            false
        }
    }

    /// Like [`Self::take`], but fails with a [`ParseError`] instead of
    /// returning `false`.
    pub fn xtake(&mut self, needle: &[u8]) -> Result<(), ParseError> {
        if self.take(needle) {
            Ok(())
        } else {
            Err(self.fail(format!(
                "expected {:?}",
                String::from_utf8_lossy(needle)
            )))
        }
    }

    /// Consume a single space (SP, 0x20). Does not advance on failure.
    pub fn space(&mut self) -> bool {
        self.take(b" ")
    }

    pub fn xspace(&mut self) -> Result<(), ParseError> {
        if self.space() {
            Ok(())
        } else {
            Err(self.fail("expected SP"))
        }
    }

    /// Greedily consume a (possibly empty) run of ASCII digits, returning
    /// the consumed bytes. The same bytes appear in `original` and `upper`,
    /// so it doesn't matter which view this reads from.
    pub fn digits(&mut self) -> Vec<u8> {
        let start = self.offset;
        while self
            .upper
            .get(self.offset)
            .is_some_and(|&b| charset::is_digit(b))
        {
            self.offset += 1;
        }
        self.original[start..self.offset].to_vec()
    }

    /// Consume exactly `n` bytes (from `original`) regardless of content.
    /// Fails without advancing if fewer than `n` bytes remain.
    pub fn taken(&mut self, n: usize) -> Result<Vec<u8>, ParseError> {
        if self.offset + n > self.original.len() {
            return Err(self.fail(format!("expected {n} more byte(s)")));
        }
        let bytes = self.original[self.offset..self.offset + n].to_vec();
        self.offset += n;
        Ok(bytes)
    }

    /// Consume one byte matching `pred` (checked against `original`, so
    /// the predicate sees the client's actual casing). Advances by one
    /// byte on success; leaves the cursor untouched on failure.
    pub fn take_while_original(&mut self, pred: impl Fn(u8) -> bool) -> Vec<u8> {
        let start = self.offset;
        while self.original.get(self.offset).is_some_and(|&b| pred(b)) {
            self.offset += 1;
        }
        self.original[start..self.offset].to_vec()
    }

    /// Push a grammar-production label onto the context stack. Every
    /// [`ParseError`] raised for the rest of this command's parse reports
    /// it as part of its context path.
    ///
    /// Labels are never popped: a command's `Cursor` is single-use (one
    /// line, rebound across any literals it contains, then discarded), and
    /// a parse failure always aborts the whole command via `?` rather than
    /// continuing on the same cursor -- so there's no later, unrelated
    /// error that a stale label could mislabel.
    pub fn context(&mut self, label: &'static str) {
        self.context.push(label);
    }

    fn context_snapshot(&self) -> Vec<&'static str> {
        self.context.clone()
    }

    fn preview(&self) -> String {
        let remaining = self.remaining_original();
        let truncated = &remaining[..remaining.len().min(PREVIEW_LEN)];
        let mut preview = String::from_utf8_lossy(truncated).into_owned();
        if remaining.len() > PREVIEW_LEN {
            preview.push('\u{2026}');
        }
        preview
    }

    /// Build a syntax error anchored at the current position, with no
    /// machine-readable code or continuation payload.
    pub fn fail(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            context: self.context_snapshot(),
            remaining_preview: self.preview(),
            code: None,
            continuation: None,
        }
    }

    /// Build a syntax error carrying a response code and a pre-formatted
    /// continuation line, for failures the server must answer with more
    /// than a tagged `BAD`/`NO` (e.g. `TOOBIG`).
    pub fn fail_with_code(
        &self,
        message: impl Into<String>,
        code: &'static str,
        continuation: impl Into<String>,
    ) -> ParseError {
        ParseError {
            message: message.into(),
            context: self.context_snapshot(),
            remaining_preview: self.preview(),
            code: Some(code),
            continuation: Some(continuation.into()),
        }
    }
}
