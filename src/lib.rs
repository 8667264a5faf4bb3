//! MaiRust Core - IMAP4 command parser
//!
//! This crate provides the command-line parser for MaiRust's IMAP4
//! service: turning a tagged command line (plus any literals it
//! references) into a typed [`imap::Command`]. Reading bytes off a
//! socket, executing parsed commands, and writing responses back are
//! the connection layer's job, not this crate's.

pub mod imap;

pub use imap::{Capabilities, Command, CommandBody, Failure, ParseError, ParserConfig, Transport};
