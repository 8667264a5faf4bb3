//! The command dispatcher: one parser entry point per IMAP command the
//! server accepts, all built out of the lexical and structural primitives
//! in the rest of this module.
//!
//! [`parse_command`] is the single function the connection layer calls:
//! feed it a cursor already positioned at the start of a command line
//! (the tag) and the parser's configured limits, and it either returns a
//! fully-typed [`Command`] or a [`Failure`] -- a syntax error the caller
//! answers with a tagged `BAD` (or, for `TOOBIG` and friends, the
//! supplied continuation line plus a fatal response), or a transport
//! error that means the connection itself is gone.

use crate::imap::command::{Command, CommandBody, StoreSign};
use crate::imap::config::ParserConfig;
use crate::imap::cursor::Cursor;
use crate::imap::datetime;
use crate::imap::error::Failure;
use crate::imap::lexical;
use crate::imap::mailbox;
use crate::imap::search;
use crate::imap::section;
use crate::imap::status;

/// Parse one full command line. `cursor` must be positioned at offset
/// zero of the line containing the tag; if the command includes a
/// literal, the cursor is rebound to subsequent lines internally and the
/// final cursor position (on return) is the end of whatever line followed
/// the last literal.
pub async fn parse_command(cursor: &mut Cursor<'_>, config: &ParserConfig) -> Result<Command, Failure> {
    check_line_length(cursor, config)?;

    let lit8_allowed = cursor.transport().capabilities().binary;
    let max_literal = config.max_literal_octets;

    let tag = {
        let _ctx = cursor.context("tag");
        lexical::tag(cursor).map_err(Failure::Syntax)?
    };
    cursor.xspace().map_err(Failure::Syntax)?;
    let name = {
        let _ctx = cursor.context("command");
        lexical::command_name(cursor).map_err(Failure::Syntax)?
    };

    cursor.context("args");
    let body = dispatch(cursor, &name, lit8_allowed, max_literal).await?;

    if !cursor.is_empty() {
        return Err(Failure::Syntax(cursor.fail("unexpected data after command")));
    }

    Ok(Command { tag, body })
}

/// Reject a line longer than `config.max_line_octets` before any other
/// parsing happens. `0` means unbounded, the same convention
/// `max_literal_octets` uses. Only the currently-buffered line is checked --
/// a command that spans a literal is bounded line-by-line as each
/// continuation arrives, not by its total length, since literal payloads
/// are covered separately by `max_literal_octets`.
fn check_line_length(cursor: &Cursor<'_>, config: &ParserConfig) -> Result<(), Failure> {
    if config.max_line_octets > 0 && cursor.line_len() > config.max_line_octets {
        return Err(Failure::Syntax(cursor.fail(format!(
            "command line of {} octets exceeds the {} octet limit",
            cursor.line_len(),
            config.max_line_octets
        ))));
    }
    Ok(())
}

async fn dispatch(
    cursor: &mut Cursor<'_>,
    name: &str,
    lit8_allowed: bool,
    max_literal: u64,
) -> Result<CommandBody, Failure> {
    match name {
        "CAPABILITY" => Ok(CommandBody::Capability),
        "NOOP" => Ok(CommandBody::Noop),
        "LOGOUT" => Ok(CommandBody::Logout),
        "STARTTLS" => Ok(CommandBody::StartTls),
        "CHECK" => Ok(CommandBody::Check),
        "CLOSE" => Ok(CommandBody::Close),
        "EXPUNGE" => Ok(CommandBody::Expunge { uid_set: None }),
        "UID EXPUNGE" => {
            let _ctx = cursor.context("uid-expunge");
            cursor.xspace().map_err(Failure::Syntax)?;
            let set = section::num_set(cursor).map_err(Failure::Syntax)?;
            Ok(CommandBody::Expunge { uid_set: Some(set) })
        }
        "IDLE" => Ok(CommandBody::Idle),
        "DONE" => Ok(CommandBody::Done),
        "NAMESPACE" => Ok(CommandBody::Namespace),

        "LOGIN" => parse_login(cursor, lit8_allowed, max_literal).await,
        "AUTHENTICATE" => parse_authenticate(cursor),

        "SELECT" => Ok(CommandBody::Select {
            mailbox: parse_mailbox_arg(cursor, lit8_allowed, max_literal).await?,
        }),
        "EXAMINE" => Ok(CommandBody::Examine {
            mailbox: parse_mailbox_arg(cursor, lit8_allowed, max_literal).await?,
        }),
        "CREATE" => Ok(CommandBody::Create {
            mailbox: parse_mailbox_arg(cursor, lit8_allowed, max_literal).await?,
        }),
        "DELETE" => Ok(CommandBody::Delete {
            mailbox: parse_mailbox_arg(cursor, lit8_allowed, max_literal).await?,
        }),
        "SUBSCRIBE" => Ok(CommandBody::Subscribe {
            mailbox: parse_mailbox_arg(cursor, lit8_allowed, max_literal).await?,
        }),
        "UNSUBSCRIBE" => Ok(CommandBody::Unsubscribe {
            mailbox: parse_mailbox_arg(cursor, lit8_allowed, max_literal).await?,
        }),
        "RENAME" => {
            let from = parse_mailbox_arg(cursor, lit8_allowed, max_literal).await?;
            let to = parse_mailbox_arg(cursor, lit8_allowed, max_literal).await?;
            Ok(CommandBody::Rename { from, to })
        }
        "LIST" => {
            parse_list_like(cursor, lit8_allowed, max_literal, |reference, pattern| {
                CommandBody::List { reference, pattern }
            })
            .await
        }
        "LSUB" => {
            parse_list_like(cursor, lit8_allowed, max_literal, |reference, pattern| {
                CommandBody::Lsub { reference, pattern }
            })
            .await
        }
        "STATUS" => parse_status(cursor, lit8_allowed, max_literal).await,
        "APPEND" => parse_append(cursor, lit8_allowed, max_literal).await,

        "FETCH" => parse_fetch(cursor, false),
        "UID FETCH" => parse_fetch(cursor, true),
        "SEARCH" => parse_search(cursor, lit8_allowed, max_literal, false).await,
        "UID SEARCH" => parse_search(cursor, lit8_allowed, max_literal, true).await,
        "STORE" => parse_store(cursor, false),
        "UID STORE" => parse_store(cursor, true),
        "COPY" => parse_copy(cursor, lit8_allowed, max_literal, false).await,
        "UID COPY" => parse_copy(cursor, lit8_allowed, max_literal, true).await,
        "MOVE" => parse_copy_move(cursor, lit8_allowed, max_literal, false).await,
        "UID MOVE" => parse_copy_move(cursor, lit8_allowed, max_literal, true).await,

        _ => Err(Failure::Syntax(cursor.fail(format!("unknown command {name:?}")))),
    }
}

async fn parse_mailbox_arg(cursor: &mut Cursor<'_>, lit8_allowed: bool, max_literal: u64) -> Result<String, Failure> {
    cursor.xspace().map_err(Failure::Syntax)?;
    mailbox::mailbox(cursor, lit8_allowed, max_literal).await
}

async fn parse_login(cursor: &mut Cursor<'_>, lit8_allowed: bool, max_literal: u64) -> Result<CommandBody, Failure> {
    let _ctx = cursor.context("login");
    cursor.xspace().map_err(Failure::Syntax)?;
    let user = lexical::astring_utf8(cursor, lit8_allowed, max_literal).await?;
    cursor.xspace().map_err(Failure::Syntax)?;
    let pass = lexical::astring_utf8(cursor, lit8_allowed, max_literal).await?;
    Ok(CommandBody::Login { user, pass })
}

fn parse_authenticate(cursor: &mut Cursor<'_>) -> Result<CommandBody, Failure> {
    let _ctx = cursor.context("authenticate");
    cursor.xspace().map_err(Failure::Syntax)?;
    let mechanism = lexical::atom(cursor).map_err(Failure::Syntax)?.to_ascii_uppercase();
    Ok(CommandBody::Authenticate { mechanism })
}

async fn parse_list_like(
    cursor: &mut Cursor<'_>,
    lit8_allowed: bool,
    max_literal: u64,
    build: impl FnOnce(String, String) -> CommandBody,
) -> Result<CommandBody, Failure> {
    let _ctx = cursor.context("list");
    cursor.xspace().map_err(Failure::Syntax)?;
    let reference = mailbox::mailbox(cursor, lit8_allowed, max_literal).await?;
    cursor.xspace().map_err(Failure::Syntax)?;
    let pattern = mailbox::list_mailbox(cursor, lit8_allowed, max_literal).await?;
    Ok(build(reference, pattern))
}

async fn parse_status(cursor: &mut Cursor<'_>, lit8_allowed: bool, max_literal: u64) -> Result<CommandBody, Failure> {
    let _ctx = cursor.context("status");
    cursor.xspace().map_err(Failure::Syntax)?;
    let mailbox = mailbox::mailbox(cursor, lit8_allowed, max_literal).await?;
    cursor.xspace().map_err(Failure::Syntax)?;
    let atts = status::status_att_list(cursor).map_err(Failure::Syntax)?;
    Ok(CommandBody::Status { mailbox, atts })
}

/// `append = "APPEND" SP mailbox [SP flag-list] [SP date-time] SP literal`
///
/// The two middle components are each optional, so rather than
/// unconditionally consuming a separating space and discovering the wrong
/// production follows it, each branch peeks two bytes ahead (`SP` then
/// the production's distinguishing first character) before committing to
/// consume anything.
async fn parse_append(cursor: &mut Cursor<'_>, lit8_allowed: bool, max_literal: u64) -> Result<CommandBody, Failure> {
    let _ctx = cursor.context("append");
    cursor.xspace().map_err(Failure::Syntax)?;
    let mailbox = mailbox::mailbox(cursor, lit8_allowed, max_literal).await?;

    let mut flags = Vec::new();
    if cursor.peek() == Some(b' ') && cursor.peek_at(1) == Some(b'(') {
        cursor.space();
        flags = lexical::flag_list(cursor).map_err(Failure::Syntax)?;
    }

    let mut date = None;
    if cursor.peek() == Some(b' ') && cursor.peek_at(1) == Some(b'"') {
        cursor.space();
        date = Some(datetime::date_time(cursor).map_err(Failure::Syntax)?);
    }

    cursor.xspace().map_err(Failure::Syntax)?;
    let message = lexical::string(cursor, lit8_allowed, max_literal).await?;
    Ok(CommandBody::Append { mailbox, flags, date, message })
}

fn parse_fetch(cursor: &mut Cursor<'_>, uid: bool) -> Result<CommandBody, Failure> {
    let _ctx = cursor.context("fetch");
    cursor.xspace().map_err(Failure::Syntax)?;
    let sequence = section::num_set(cursor).map_err(Failure::Syntax)?;
    cursor.xspace().map_err(Failure::Syntax)?;
    let atts = section::fetch_atts(cursor)?;
    Ok(CommandBody::Fetch { sequence, atts, uid })
}

async fn parse_search(
    cursor: &mut Cursor<'_>,
    lit8_allowed: bool,
    max_literal: u64,
    uid: bool,
) -> Result<CommandBody, Failure> {
    let _ctx = cursor.context("search");
    cursor.xspace().map_err(Failure::Syntax)?;

    let mut charset = None;
    if cursor.take(b"CHARSET") {
        cursor.xspace().map_err(Failure::Syntax)?;
        charset = Some(lexical::astring_utf8(cursor, lit8_allowed, max_literal).await?);
        cursor.xspace().map_err(Failure::Syntax)?;
    }

    let key = search::search_program(cursor, lit8_allowed, max_literal).await?;
    Ok(CommandBody::Search { charset, key, uid })
}

/// `store-att-flags = (["+" / "-"] "FLAGS" [".SILENT"]) SP (flag-list / (flag *(SP flag)))`
fn parse_store(cursor: &mut Cursor<'_>, uid: bool) -> Result<CommandBody, Failure> {
    let _ctx = cursor.context("store");
    cursor.xspace().map_err(Failure::Syntax)?;
    let sequence = section::num_set(cursor).map_err(Failure::Syntax)?;
    cursor.xspace().map_err(Failure::Syntax)?;

    let sign = if cursor.take(b"+") {
        StoreSign::Add
    } else if cursor.take(b"-") {
        StoreSign::Remove
    } else {
        StoreSign::Set
    };
    cursor.xtake(b"FLAGS").map_err(Failure::Syntax)?;
    let silent = cursor.take(b".SILENT");
    cursor.xspace().map_err(Failure::Syntax)?;

    let flags = if cursor.peek() == Some(b'(') {
        lexical::flag_list(cursor).map_err(Failure::Syntax)?
    } else {
        let mut flags = vec![lexical::flag(cursor).map_err(Failure::Syntax)?];
        while cursor.space() {
            flags.push(lexical::flag(cursor).map_err(Failure::Syntax)?);
        }
        flags
    };

    Ok(CommandBody::Store { sequence, silent, sign, flags, uid })
}

async fn parse_copy(cursor: &mut Cursor<'_>, lit8_allowed: bool, max_literal: u64, uid: bool) -> Result<CommandBody, Failure> {
    let (sequence, mailbox) = parse_sequence_and_mailbox(cursor, lit8_allowed, max_literal, "copy").await?;
    Ok(CommandBody::Copy { sequence, mailbox, uid })
}

async fn parse_copy_move(cursor: &mut Cursor<'_>, lit8_allowed: bool, max_literal: u64, uid: bool) -> Result<CommandBody, Failure> {
    let (sequence, mailbox) = parse_sequence_and_mailbox(cursor, lit8_allowed, max_literal, "move").await?;
    Ok(CommandBody::Move { sequence, mailbox, uid })
}

async fn parse_sequence_and_mailbox(
    cursor: &mut Cursor<'_>,
    lit8_allowed: bool,
    max_literal: u64,
    label: &'static str,
) -> Result<(crate::imap::command::NumSet, String), Failure> {
    let _ctx = cursor.context(label);
    cursor.xspace().map_err(Failure::Syntax)?;
    let sequence = section::num_set(cursor).map_err(Failure::Syntax)?;
    cursor.xspace().map_err(Failure::Syntax)?;
    let mailbox = mailbox::mailbox(cursor, lit8_allowed, max_literal).await?;
    Ok((sequence, mailbox))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imap::command::{FetchAtt, NumRange, NumSet, SearchKey, SectionSpec, SetNumber};
    use crate::imap::transport::test_support::ScriptedTransport;
    use pretty_assertions::assert_eq;

    async fn parse(line: &str, t: &mut ScriptedTransport) -> Result<Command, Failure> {
        let config = ParserConfig::default();
        let mut c = Cursor::new(line.to_string(), t);
        parse_command(&mut c, &config).await
    }

    #[tokio::test]
    async fn login_with_quoted_strings() {
        let mut t = ScriptedTransport::new(vec![]);
        let cmd = parse(r#"a001 LOGIN "alice" "pw""#, &mut t).await.unwrap();
        assert_eq!(cmd.tag, "a001");
        assert_eq!(
            cmd.body,
            CommandBody::Login { user: "alice".into(), pass: "pw".into() }
        );
    }

    #[tokio::test]
    async fn uid_fetch_with_peek_and_header_fields() {
        let mut t = ScriptedTransport::new(vec![]);
        let cmd = parse(
            "x UID FETCH 1:* (UID FLAGS BODY.PEEK[HEADER.FIELDS (From To)])",
            &mut t,
        )
        .await
        .unwrap();
        assert_eq!(cmd.tag, "x");
        match cmd.body {
            CommandBody::Fetch { sequence, atts, uid } => {
                assert!(uid);
                assert_eq!(
                    sequence,
                    NumSet::Ranges(vec![NumRange { first: SetNumber::Value(1), last: Some(SetNumber::Star) }])
                );
                assert_eq!(atts.len(), 3);
                let body = atts.iter().find(|a: &&FetchAtt| a.field == "BODY").unwrap();
                assert!(body.peek);
                assert!(matches!(&body.section, Some(SectionSpec::Msgtext(_))));
            }
            other => panic!("expected FETCH, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_or_not_and_uid() {
        let mut t = ScriptedTransport::new(vec![]);
        let cmd = parse(r#"t SEARCH OR FROM "a@b" NOT SUBJECT "x""#, &mut t).await.unwrap();
        match cmd.body {
            CommandBody::Search { key, uid, .. } => {
                assert!(!uid);
                assert_eq!(
                    key,
                    SearchKey::Or(
                        Box::new(SearchKey::From("a@b".into())),
                        Box::new(SearchKey::Not(Box::new(SearchKey::Subject("x".into())))),
                    )
                );
            }
            other => panic!("expected SEARCH, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn append_reads_the_literal_and_rebinds() {
        let mut t = ScriptedTransport::new(vec!["", ""]).push_literal(*b"hello world");
        let cmd = parse("t APPEND INBOX {11+}", &mut t).await.unwrap();
        match cmd.body {
            CommandBody::Append { mailbox, message, flags, date } => {
                assert_eq!(mailbox, "INBOX");
                assert_eq!(message, b"hello world");
                assert!(flags.is_empty());
                assert!(date.is_none());
            }
            other => panic!("expected APPEND, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn append_over_max_literal_fails_toobig_without_reading() {
        let mut t = ScriptedTransport::new(vec![]);
        let mut c = Cursor::new("t APPEND INBOX {9999999999}".to_string(), &mut t);
        let config = ParserConfig { max_literal_octets: 102_400, ..ParserConfig::default() };
        let err = parse_command(&mut c, &config).await.unwrap_err();
        match err {
            Failure::Syntax(e) => {
                assert_eq!(e.code, Some("TOOBIG"));
                let continuation = e.continuation.unwrap();
                assert!(continuation.contains("Max literal size 9999999999"));
                assert!(continuation.contains("allowed 102400"));
            }
            Failure::Transport(_) => panic!("must fail before touching the transport"),
        }
    }

    #[tokio::test]
    async fn status_parses_attribute_list() {
        let mut t = ScriptedTransport::new(vec![]);
        let cmd = parse("t STATUS INBOX (MESSAGES UIDNEXT)", &mut t).await.unwrap();
        match cmd.body {
            CommandBody::Status { mailbox, atts } => {
                assert_eq!(mailbox, "INBOX");
                assert_eq!(
                    atts,
                    vec![crate::imap::command::StatusAtt::Messages, crate::imap::command::StatusAtt::UidNext]
                );
            }
            other => panic!("expected STATUS, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn store_parses_sign_and_silent_and_flags() {
        let mut t = ScriptedTransport::new(vec![]);
        let cmd = parse("t STORE 1:5 +FLAGS.SILENT (\\Seen \\Deleted)", &mut t).await.unwrap();
        match cmd.body {
            CommandBody::Store { sign, silent, flags, uid, .. } => {
                assert_eq!(sign, StoreSign::Add);
                assert!(silent);
                assert!(!uid);
                assert_eq!(flags, vec!["\\Seen".to_string(), "\\Deleted".to_string()]);
            }
            other => panic!("expected STORE, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn command_is_case_insensitive() {
        let mut t1 = ScriptedTransport::new(vec![]);
        let a = parse("a1 select inbox", &mut t1).await.unwrap();
        let mut t2 = ScriptedTransport::new(vec![]);
        let b = parse("a1 SELECT inbox", &mut t2).await.unwrap();
        assert_eq!(a.body, b.body);
    }

    #[tokio::test]
    async fn bare_expunge_takes_no_argument() {
        let mut t = ScriptedTransport::new(vec![]);
        let cmd = parse("t EXPUNGE", &mut t).await.unwrap();
        assert_eq!(cmd.body, CommandBody::Expunge { uid_set: None });
    }

    #[tokio::test]
    async fn uid_expunge_requires_a_sequence_set() {
        let mut t = ScriptedTransport::new(vec![]);
        let cmd = parse("t UID EXPUNGE 1:5", &mut t).await.unwrap();
        assert_eq!(
            cmd.body,
            CommandBody::Expunge {
                uid_set: Some(NumSet::Ranges(vec![NumRange {
                    first: SetNumber::Value(1),
                    last: Some(SetNumber::Value(5)),
                }]))
            }
        );
        let mut t2 = ScriptedTransport::new(vec![]);
        assert!(parse("t UID EXPUNGE", &mut t2).await.is_err());
    }

    #[tokio::test]
    async fn line_within_limit_is_accepted() {
        let mut t = ScriptedTransport::new(vec![]);
        let config = ParserConfig { max_line_octets: 64, ..ParserConfig::default() };
        let mut c = Cursor::new("t NOOP".to_string(), &mut t);
        assert!(parse_command(&mut c, &config).await.is_ok());
    }

    #[tokio::test]
    async fn line_over_max_line_octets_is_rejected_before_parsing() {
        let mut t = ScriptedTransport::new(vec![]);
        let config = ParserConfig { max_line_octets: 16, ..ParserConfig::default() };
        let mut c = Cursor::new("t SELECT a-mailbox-name-much-longer-than-the-limit".to_string(), &mut t);
        let err = parse_command(&mut c, &config).await.unwrap_err();
        match err {
            Failure::Syntax(e) => assert!(e.message.contains("16 octet limit")),
            Failure::Transport(_) => panic!("expected a syntax failure"),
        }
    }

    #[tokio::test]
    async fn zero_max_line_octets_means_unbounded() {
        let mut t = ScriptedTransport::new(vec![]);
        let config = ParserConfig { max_line_octets: 0, ..ParserConfig::default() };
        let mut c = Cursor::new("t NOOP".to_string(), &mut t);
        assert!(parse_command(&mut c, &config).await.is_ok());
    }

    #[tokio::test]
    async fn trailing_garbage_is_rejected() {
        let mut t = ScriptedTransport::new(vec![]);
        assert!(parse("t NOOP extra", &mut t).await.is_err());
    }

    #[tokio::test]
    async fn unknown_command_is_a_syntax_error() {
        let mut t = ScriptedTransport::new(vec![]);
        assert!(parse("t BOGUSCOMMAND", &mut t).await.is_err());
    }
}
