//! Percent-escaping of path segment ids
//!
//! Ids may contain any character. Everything outside the safe set
//! `[A-Za-z0-9._~:@-]` is written as `%XX` triplets (uppercase hex) of its
//! UTF-8 bytes, so that `/` and `;` never appear unescaped inside an id.
//!
//! Both directions work off a 256-entry lookup table and borrow the input
//! when nothing needs rewriting.

use crate::error::{Error, Result};
use std::borrow::Cow;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

const fn safe_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0;
    while b < 256 {
        let c = b as u8;
        table[b] = c.is_ascii_alphanumeric()
            || c == b'.'
            || c == b'_'
            || c == b'~'
            || c == b':'
            || c == b'@'
            || c == b'-';
        b += 1;
    }
    table
}

static SAFE: [bool; 256] = safe_table();

/// Whether a byte is passed through unescaped
#[inline]
pub fn is_safe(byte: u8) -> bool {
    SAFE[byte as usize]
}

/// Escape an id for use in a path string
pub fn encode(id: &str) -> Cow<'_, str> {
    let bytes = id.as_bytes();
    let Some(first) = bytes.iter().position(|&b| !is_safe(b)) else {
        return Cow::Borrowed(id);
    };

    let mut out = String::with_capacity(id.len() + 8);
    out.push_str(&id[..first]);
    for &b in &bytes[first..] {
        if is_safe(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    Cow::Owned(out)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode percent-triplets back into the original id
///
/// # Errors
///
/// Returns [`Error::Decode`] on a truncated triplet, a non-hex digit, or
/// when the decoded bytes are not valid UTF-8.
pub fn decode(encoded: &str) -> Result<Cow<'_, str>> {
    let bytes = encoded.as_bytes();
    let Some(first) = bytes.iter().position(|&b| b == b'%') else {
        return Ok(Cow::Borrowed(encoded));
    };

    let mut out = Vec::with_capacity(bytes.len());
    out.extend_from_slice(&bytes[..first]);
    let mut i = first;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'%' {
            out.push(b);
            i += 1;
            continue;
        }
        if i + 2 >= bytes.len() {
            return Err(Error::decode(format!(
                "truncated escape at offset {} in '{}'",
                i, encoded
            )));
        }
        match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
            (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
            _ => {
                return Err(Error::decode(format!(
                    "invalid escape '{}' at offset {} in '{}'",
                    String::from_utf8_lossy(&bytes[i..i + 3]),
                    i,
                    encoded
                )))
            }
        }
        i += 3;
    }

    String::from_utf8(out)
        .map(Cow::Owned)
        .map_err(|e| Error::decode(format!("invalid UTF-8 in '{}': {}", encoded, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_set_passes_through_borrowed() {
        let id = "AZaz09._~:@-";
        assert!(matches!(encode(id), Cow::Borrowed(_)));
        assert_eq!(encode(id), id);
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        assert_eq!(encode("a/b"), "a%2Fb");
        assert_eq!(encode("a;b"), "a%3Bb");
        assert_eq!(encode("a\\b"), "a%5Cb");
        assert_eq!(encode("a b%"), "a%20b%25");
    }

    #[test]
    fn test_multibyte_is_escaped_per_byte() {
        assert_eq!(encode("é"), "%C3%A9");
        assert_eq!(decode("%C3%A9").unwrap(), "é");
    }

    #[test]
    fn test_decode_lowercase_hex() {
        assert_eq!(decode("a%2fb").unwrap(), "a/b");
    }

    #[test]
    fn test_decode_truncated_escape_fails() {
        assert!(matches!(decode("abc%2"), Err(Error::Decode { .. })));
        assert!(matches!(decode("abc%"), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_decode_invalid_hex_fails() {
        assert!(matches!(decode("a%zzb"), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_decode_invalid_utf8_fails() {
        assert!(matches!(decode("%C3"), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_round_trip() {
        for id in ["plain", "with space", "semi;colon", "slash/inside", "ünïcødé", "%41"] {
            assert_eq!(decode(&encode(id)).unwrap(), id);
        }
    }
}
