//! HIPS text header parsing.
//!
//! A HIPS file opens with free-form text terminated by a newline followed by
//! a period. The first five whitespace-separated tokens of that text are
//! `tag bands res_x res_y fmt`. The header is read one byte per character
//! (ISO-8859-1), so arbitrary binary payload after the terminator never
//! affects tokenization.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{Error, Result};

/// Byte sequence that ends the text header.
pub const HEADER_TERMINATOR: &[u8; 2] = b"\n.";

/// Number of leading tokens the header must carry.
pub const REQUIRED_TOKENS: usize = 5;

/// Fields extracted from a HIPS text header.
///
/// Values are taken as written; zero or negative dimensions are not rejected
/// here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HipsHeader {
    /// Byte offset of the first `"\n."` in the file.
    pub header_length: usize,
    /// Token 0. Reported but not interpreted.
    pub tag: String,
    pub bands: i64,
    pub res_x: i64,
    pub res_y: i64,
    /// Sample format code. Carried through; decoding always assumes float32.
    pub fmt: i64,
}

impl HipsHeader {
    /// The header as `(header_length, bands, res_x, res_y, fmt)`.
    pub fn as_tuple(&self) -> (usize, i64, i64, i64, i64) {
        (
            self.header_length,
            self.bands,
            self.res_x,
            self.res_y,
            self.fmt,
        )
    }

    /// Number of samples in the declared cube, or `None` when a dimension is
    /// negative or the product overflows.
    pub fn element_count(&self) -> Option<usize> {
        let bands = usize::try_from(self.bands).ok()?;
        let res_x = usize::try_from(self.res_x).ok()?;
        let res_y = usize::try_from(self.res_y).ok()?;
        bands.checked_mul(res_x)?.checked_mul(res_y)
    }
}

/// Returns the offset of the first `"\n."` sequence in `data`.
pub fn find_header_length(data: &[u8]) -> Result<usize> {
    data.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
        .ok_or(Error::MissingTerminator)
}

/// Whitespace as seen by the reference tokenizer on ISO-8859-1 text.
fn is_header_space(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0B | 0x0C | b'\r' | 0x1C..=0x1F | b' ' | 0x85 | 0xA0)
}

/// Splits header bytes into whitespace-separated tokens.
fn tokenize(text: &[u8]) -> Vec<&[u8]> {
    text.split(|&b| is_header_space(b))
        .filter(|t| !t.is_empty())
        .collect()
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Parses an integer token: optional sign, ASCII digits, and single
/// underscores allowed between digits.
fn parse_int(token: &[u8]) -> Option<i64> {
    let (negative, digits) = match token.first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };
    if digits.is_empty() || digits[0] == b'_' || digits[digits.len() - 1] == b'_' {
        return None;
    }

    let mut value: i64 = 0;
    let mut prev_underscore = false;
    for &b in digits {
        match b {
            b'0'..=b'9' => {
                let d = i64::from(b - b'0');
                value = value.checked_mul(10)?;
                value = if negative {
                    value.checked_sub(d)?
                } else {
                    value.checked_add(d)?
                };
                prev_underscore = false;
            }
            b'_' if !prev_underscore => prev_underscore = true,
            _ => return None,
        }
    }
    Some(value)
}

fn field(tokens: &[&[u8]], position: usize) -> Result<i64> {
    let token = tokens[position];
    parse_int(token).ok_or_else(|| Error::InvalidToken {
        position,
        token: latin1_to_string(token),
    })
}

/// Parses the HIPS header at the start of `data`.
///
/// `data` may be the complete file; only the bytes before the terminator are
/// tokenized.
pub fn parse_header(data: &[u8]) -> Result<HipsHeader> {
    let header_length = find_header_length(data)?;
    let tokens = tokenize(&data[..header_length]);
    if tokens.len() < REQUIRED_TOKENS {
        return Err(Error::TooFewTokens(tokens.len()));
    }

    let header = HipsHeader {
        header_length,
        tag: latin1_to_string(tokens[0]),
        bands: field(&tokens, 1)?,
        res_x: field(&tokens, 2)?,
        res_y: field(&tokens, 3)?,
        fmt: field(&tokens, 4)?,
    };
    log::trace!(
        "parsed HIPS header: length={} bands={} res_x={} res_y={} fmt={}",
        header.header_length,
        header.bands,
        header.res_x,
        header.res_y,
        header.fmt
    );
    Ok(header)
}

/// Encodes `tag` as one Latin-1 header token.
///
/// Characters above U+00FF and header whitespace (which includes the `'\n'`
/// of the terminator) are rejected, so the tag always parses back unchanged.
fn tag_bytes(tag: &str) -> Result<Vec<u8>> {
    tag.chars()
        .map(|ch| match u8::try_from(u32::from(ch)) {
            Ok(b) if !is_header_space(b) => Ok(b),
            _ => Err(Error::InvalidTag(String::from(tag))),
        })
        .collect()
}

/// Serializes a header as `"tag bands res_x res_y fmt\n.\n"`, padded with
/// newlines to a multiple of `align` bytes so a payload appended after it
/// stays on the sample grid. An empty tag is written as `HIPS`.
pub fn format_header(
    tag: &str,
    bands: i64,
    res_x: i64,
    res_y: i64,
    fmt: i64,
    align: usize,
) -> Result<Vec<u8>> {
    let mut out = tag_bytes(if tag.is_empty() { "HIPS" } else { tag })?;
    out.extend_from_slice(format!(" {bands} {res_x} {res_y} {fmt}").as_bytes());
    out.extend_from_slice(HEADER_TERMINATOR);
    out.push(b'\n');
    while align > 1 && out.len() % align != 0 {
        out.push(b'\n');
    }
    Ok(out)
}

/// Reads the file at `path` once and parses its header.
#[cfg(feature = "std")]
pub fn read_header<P: AsRef<std::path::Path>>(path: P) -> Result<HipsHeader> {
    let data = std::fs::read(path)?;
    parse_header(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn terminator_offset() {
        assert_eq!(find_header_length(b"TAG 3 4 5 1\n.rest").unwrap(), 11);
        assert_eq!(find_header_length(b"\n.").unwrap(), 0);
    }

    #[test]
    fn terminator_first_occurrence_wins() {
        assert_eq!(find_header_length(b"A 1\n.\n.").unwrap(), 3);
    }

    #[test]
    fn terminator_needs_both_bytes() {
        let e = find_header_length(b"TAG 1 2 3 4\n").unwrap_err();
        assert!(matches!(e, Error::MissingTerminator));
        let e = find_header_length(b"TAG .1 2 3 4").unwrap_err();
        assert!(matches!(e, Error::MissingTerminator));
        assert!(find_header_length(b"").is_err());
    }

    #[test]
    fn parse_basic_header() {
        let mut data = b"TAG 3 4 5 1\n.".to_vec();
        data.extend_from_slice(&[0xFF, 0x00, 0x80, 0x3F]);
        let h = parse_header(&data).unwrap();
        assert_eq!(h.as_tuple(), (11, 3, 4, 5, 1));
        assert_eq!(h.tag, "TAG");
        assert_eq!(h.element_count(), Some(60));
    }

    #[test]
    fn multiline_header_with_extra_tokens() {
        let data = b"HIPS\n 2\t 8\r\n 6 3 extra words\n  more\n.\n";
        let h = parse_header(data).unwrap();
        assert_eq!((h.bands, h.res_x, h.res_y, h.fmt), (2, 8, 6, 3));
    }

    #[test]
    fn latin1_whitespace_separates_tokens() {
        let data = b"T\xa01\x852\x1c3 4\n.";
        let h = parse_header(data).unwrap();
        assert_eq!((h.bands, h.res_x, h.res_y, h.fmt), (1, 2, 3, 4));
    }

    #[test]
    fn high_bytes_in_tag() {
        let data = b"\xe9t\xe9 1 1 1 0\n.";
        let h = parse_header(data).unwrap();
        assert_eq!(h.tag, "\u{e9}t\u{e9}");
    }

    #[test]
    fn too_few_tokens() {
        let e = parse_header(b"TAG 3 4 5\n.").unwrap_err();
        assert!(matches!(e, Error::TooFewTokens(4)));
        let e = parse_header(b"\n.").unwrap_err();
        assert!(matches!(e, Error::TooFewTokens(0)));
    }

    #[test]
    fn non_integer_token() {
        let e = parse_header(b"TAG 3 four 5 1\n.").unwrap_err();
        match e {
            Error::InvalidToken { position, token } => {
                assert_eq!(position, 2);
                assert_eq!(token, "four");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(parse_header(b"TAG 3 4 5 1.0\n.").is_err());
    }

    #[test]
    fn tag_is_never_converted() {
        let h = parse_header(b"12x 1 2 3 4\n.").unwrap();
        assert_eq!(h.tag, "12x".to_string());
    }

    #[test]
    fn negative_and_zero_pass_through() {
        let h = parse_header(b"T -3 0 +5 -1\n.").unwrap();
        assert_eq!((h.bands, h.res_x, h.res_y, h.fmt), (-3, 0, 5, -1));
        assert_eq!(h.element_count(), None);
    }

    #[test]
    fn integer_syntax() {
        assert_eq!(parse_int(b"1_000"), Some(1000));
        assert_eq!(parse_int(b"-0"), Some(0));
        assert_eq!(parse_int(b"007"), Some(7));
        assert_eq!(parse_int(b"1__0"), None);
        assert_eq!(parse_int(b"_1"), None);
        assert_eq!(parse_int(b"1_"), None);
        assert_eq!(parse_int(b"-"), None);
        assert_eq!(parse_int(b"0x10"), None);
        assert_eq!(parse_int(b"9223372036854775808"), None);
        assert_eq!(parse_int(b"-9223372036854775808"), Some(i64::MIN));
    }

    #[test]
    fn parsing_is_idempotent() {
        let data = b"TAG 2 2 2 0\n.\n\x00\x00\x80\x3f".to_vec();
        assert_eq!(parse_header(&data).unwrap(), parse_header(&data).unwrap());
    }

    #[test]
    fn element_count_overflow() {
        let h = HipsHeader {
            header_length: 0,
            tag: "T".to_string(),
            bands: i64::MAX,
            res_x: i64::MAX,
            res_y: 2,
            fmt: 0,
        };
        assert_eq!(h.element_count(), None);
    }

    #[test]
    fn formatted_header_parses_back() {
        let bytes = format_header("CUBE", 3, 4, 5, 1, 4).unwrap();
        assert_eq!(bytes.len() % 4, 0);
        assert!(bytes.starts_with(b"CUBE 3 4 5 1\n.\n"));
        let h = parse_header(&bytes).unwrap();
        assert_eq!(h.as_tuple(), (12, 3, 4, 5, 1));
        assert_eq!(
            format_header("", 1, 1, 1, 0, 1).unwrap(),
            b"HIPS 1 1 1 0\n.\n".to_vec()
        );
    }

    #[test]
    fn tag_must_be_one_token() {
        for tag in ["MY SCENE", "A\tB", "A\n.B", "\n.", "A\u{a0}B", "A\u{85}B"] {
            let e = format_header(tag, 1, 1, 1, 0, 4).unwrap_err();
            assert!(matches!(e, Error::InvalidTag(ref t) if t == tag), "{tag:?}");
        }
        assert!(format_header("\u{3b1}", 1, 1, 1, 0, 4).is_err());
    }

    #[test]
    fn latin1_tag_parses_back() {
        let bytes = format_header("sc\u{e8}ne.1", 2, 3, 4, 0, 4).unwrap();
        assert!(bytes.starts_with(b"sc\xe8ne.1 2 3 4 0\n.\n"));
        let h = parse_header(&bytes).unwrap();
        assert_eq!(h.tag, "sc\u{e8}ne.1");
        assert_eq!((h.bands, h.res_x, h.res_y, h.fmt), (2, 3, 4, 0));
    }

    #[test]
    fn tokenize_collapses_runs() {
        let tokens = tokenize(b"  a \t\tb\n\nc ");
        assert_eq!(tokens, vec![&b"a"[..], &b"b"[..], &b"c"[..]]);
    }
}
