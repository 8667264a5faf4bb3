//! ASCII character classes and case folding for the IMAP4 grammar.
//!
//! Every predicate here operates on raw bytes, never `char`: IMAP command
//! lines are not guaranteed to be valid UTF-8 (literals can carry arbitrary
//! octets), so classification has to survive that.

/// `CHAR = %x01-7F` -- any 7-bit US-ASCII character, excluding NUL.
#[inline]
pub fn is_char(b: u8) -> bool {
    (0x01..=0x7F).contains(&b)
}

/// `CTL = %x00-1F / %x7F` -- control characters.
#[inline]
pub fn is_ctl(b: u8) -> bool {
    b <= 0x1F || b == 0x7F
}

#[inline]
pub fn is_quoted_special(b: u8) -> bool {
    b == b'"' || b == b'\\'
}

#[inline]
pub fn is_resp_special(b: u8) -> bool {
    b == b']'
}

#[inline]
pub fn is_list_wildcard(b: u8) -> bool {
    b == b'%' || b == b'*'
}

/// `ATOM-CHAR = <any CHAR except atom-specials>`
#[inline]
pub fn is_atom_char(b: u8) -> bool {
    is_char(b)
        && !is_ctl(b)
        && b != b'('
        && b != b')'
        && b != b'{'
        && b != b' '
        && !is_list_wildcard(b)
        && !is_quoted_special(b)
        && !is_resp_special(b)
}

/// `ASTRING-CHAR = ATOM-CHAR / resp-specials`
#[inline]
pub fn is_astring_char(b: u8) -> bool {
    is_atom_char(b) || is_resp_special(b)
}

/// Like [`is_atom_char`], but also accepts the list wildcards and `]`,
/// for the unquoted form of `list-mailbox`.
#[inline]
pub fn is_list_mailbox_char(b: u8) -> bool {
    is_atom_char(b) || is_list_wildcard(b) || is_resp_special(b)
}

#[inline]
pub fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

/// ASCII-only upper-casing that preserves byte length. This is the hard
/// invariant the whole cursor depends on: `original[i]` and the upper-cased
/// view must always refer to the same logical byte, so offsets computed
/// against one are valid against the other.
pub fn upcase_ascii(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .map(|&b| if (b'a'..=b'z').contains(&b) { b - 0x20 } else { b })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn upcase_preserves_length_and_non_letters() {
        let input = b"a1B\x00\xFFz(\\)";
        let upper = upcase_ascii(input);
        assert_eq!(upper.len(), input.len());
        for (o, u) in input.iter().zip(upper.iter()) {
            if (b'a'..=b'z').contains(o) {
                assert_eq!(*u, *o - 0x20);
            } else {
                assert_eq!(u, o);
            }
        }
    }

    #[test]
    fn atom_char_excludes_specials() {
        for b in [b'(', b')', b'{', b' ', b'%', b'*', b'"', b'\\', b']'] {
            assert!(!is_atom_char(b), "{b:#x} should not be an ATOM-CHAR");
        }
        assert!(is_atom_char(b'A'));
        assert!(is_atom_char(b'9'));
        assert!(is_atom_char(b'.'));
    }

    #[test]
    fn astring_char_allows_resp_special() {
        assert!(is_astring_char(b']'));
        assert!(!is_astring_char(b'['));
    }

    #[test]
    fn ctl_covers_del_and_low_range() {
        assert!(is_ctl(0x00));
        assert!(is_ctl(0x1F));
        assert!(is_ctl(0x7F));
        assert!(!is_ctl(0x20));
    }
}
