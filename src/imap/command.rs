//! Typed results of parsing: the data model every command's arguments are
//! built out of.
//!
//! Where the grammar describes something as a genuine either/or (a
//! section is *either* a MIME part path *or* one of a fixed set of
//! message-text specifiers, never both), that's modeled here as an enum so
//! the invalid combinations aren't representable -- rather than as a
//! struct of optional fields, which is how the command dispatcher this
//! module replaces used to model it.

use chrono::{DateTime, FixedOffset, Utc};

/// One end of a sequence range: a concrete message/UID number, or `*`
/// (the highest number in use).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetNumber {
    Value(u32),
    Star,
}

/// `seq-range = seq-number ":" seq-number`, or a bare `seq-number`
/// (`last: None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumRange {
    pub first: SetNumber,
    pub last: Option<SetNumber>,
}

/// `sequence-set`, or the `$` search-result variable standing in for one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumSet {
    SearchResult,
    Ranges(Vec<NumRange>),
}

/// The message-text part of a `section-spec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionMsgtext {
    Header,
    HeaderFields(Vec<String>),
    HeaderFieldsNot(Vec<String>),
    Text,
}

/// What follows a MIME part path in a `section`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionText {
    Mime,
    Msgtext(SectionMsgtext),
}

/// A dotted path into a multipart body (`1.2.3`), with an optional
/// trailing text specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPart {
    pub path: Vec<u32>,
    pub text: Option<SectionText>,
}

/// `section-spec`: empty (the whole message), a message-text specifier, or
/// a MIME part path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSpec {
    Empty,
    Msgtext(SectionMsgtext),
    Part(SectionPart),
}

/// `"<" number "." nz-number ">"` -- a byte-range restriction on a FETCH
/// body response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partial {
    pub offset: u32,
    pub count: u32,
}

/// One item of a FETCH's `fetch-att` list, after the `ALL`/`FAST`/`FULL`
/// macros have been expanded into their constituent atts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAtt {
    /// Normalized attribute name: `"ENVELOPE"`, `"BODY"`, `"BINARY"`, ...
    pub field: String,
    /// Set when the attribute was requested in its `.PEEK` form (only
    /// meaningful for `BODY`/`BINARY`).
    pub peek: bool,
    /// `BODY[section]` / `BODY.PEEK[section]` section specifier.
    pub section: Option<SectionSpec>,
    /// `BINARY[part.path]` / `BINARY.SIZE[part.path]` part path.
    pub binary_section: Option<Vec<u32>>,
    /// `<offset.count>` restriction, valid only alongside `section` or
    /// `binary_section`.
    pub partial: Option<Partial>,
}

impl FetchAtt {
    fn simple(field: &str) -> Self {
        FetchAtt {
            field: field.to_string(),
            peek: false,
            section: None,
            binary_section: None,
            partial: None,
        }
    }

    /// Expand the `ALL`/`FAST`/`FULL` shorthand macros into their
    /// constituent attribute lists.
    pub fn expand_macro(name: &str) -> Option<Vec<FetchAtt>> {
        let fast = || {
            vec![
                FetchAtt::simple("FLAGS"),
                FetchAtt::simple("INTERNALDATE"),
                FetchAtt::simple("RFC822.SIZE"),
            ]
        };
        match name {
            "ALL" => {
                let mut atts = fast();
                atts.push(FetchAtt::simple("ENVELOPE"));
                Some(atts)
            }
            "FAST" => Some(fast()),
            "FULL" => {
                let mut atts = fast();
                atts.push(FetchAtt::simple("ENVELOPE"));
                atts.push(FetchAtt::simple("BODY"));
                Some(atts)
            }
            _ => None,
        }
    }
}

/// `search-key`, modeled as a sum type: the original grammar's
/// struct-of-optional-fields representation let nodes claim more than one
/// payload at once, which can't actually happen.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchKey {
    All,
    Answered,
    Deleted,
    Flagged,
    New,
    Old,
    Recent,
    Seen,
    Unanswered,
    Undeleted,
    Unflagged,
    Unseen,
    Draft,
    Undraft,
    Bcc(String),
    Body(String),
    Cc(String),
    From(String),
    Subject(String),
    Text(String),
    To(String),
    Keyword(String),
    Unkeyword(String),
    Header(String, String),
    Before(DateTime<Utc>),
    On(DateTime<Utc>),
    Since(DateTime<Utc>),
    SentBefore(DateTime<Utc>),
    SentOn(DateTime<Utc>),
    SentSince(DateTime<Utc>),
    Larger(u64),
    Smaller(u64),
    SeqSet(NumSet),
    Uid(NumSet),
    Not(Box<SearchKey>),
    Or(Box<SearchKey>, Box<SearchKey>),
    /// A parenthesized list of keys, implicitly AND-ed together.
    Group(Vec<SearchKey>),
}

/// `status-att`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAtt {
    Messages,
    UidNext,
    UidValidity,
    Unseen,
    Deleted,
    Size,
    Recent,
    AppendLimit,
    /// `HIGHESTMODSEQ` (CONDSTORE, RFC 7162) -- not one of the base-grammar
    /// status attributes, but a common real-world extension kept alongside
    /// them rather than rejected outright.
    HighestModSeq,
}

/// A tagged extension argument the grammar accepts but whose semantics are
/// out of scope here: kept as an opaque value, not interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedExtVal {
    Simple(String),
    NumSet(NumSet),
    Comp(Vec<TaggedExtVal>),
}

/// A parsed command: tag plus a typed payload. Arguments that the parser
/// doesn't have enough context to execute (mailbox access, flag storage,
/// ...) are still fully parsed and typed -- running them is out of scope,
/// not parsing them.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub tag: String,
    pub body: CommandBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandBody {
    Capability,
    Noop,
    Logout,
    StartTls,
    Login { user: String, pass: String },
    Authenticate { mechanism: String },
    Select { mailbox: String },
    Examine { mailbox: String },
    Create { mailbox: String },
    Delete { mailbox: String },
    Rename { from: String, to: String },
    Subscribe { mailbox: String },
    Unsubscribe { mailbox: String },
    List { reference: String, pattern: String },
    Lsub { reference: String, pattern: String },
    Status { mailbox: String, atts: Vec<StatusAtt> },
    Append { mailbox: String, flags: Vec<String>, date: Option<DateTime<FixedOffset>>, message: Vec<u8> },
    Check,
    Close,
    /// Bare `EXPUNGE` takes no argument; `UID EXPUNGE` (RFC 4315) narrows
    /// the expunge to a UID set instead of clearing every `\Deleted`
    /// message in the mailbox.
    Expunge { uid_set: Option<NumSet> },
    Search { charset: Option<String>, key: SearchKey, uid: bool },
    Fetch { sequence: NumSet, atts: Vec<FetchAtt>, uid: bool },
    Store { sequence: NumSet, silent: bool, sign: StoreSign, flags: Vec<String>, uid: bool },
    Copy { sequence: NumSet, mailbox: String, uid: bool },
    Move { sequence: NumSet, mailbox: String, uid: bool },
    Idle,
    Done,
    Namespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSign {
    Set,
    Add,
    Remove,
}
