//! Decoding of plain-text files whose encoding is unknown.
//!
//! Decoders are tried in order; the first that decodes the whole input
//! strictly and produces non-empty text wins. Latin-1 maps every byte, so the
//! chain only comes back empty for empty input.
//!
//! A prefix cut from a longer file may end inside a character, so
//! [`decode_prefix`] lets each decoder drop up to [`MAX_PARTIAL_TAIL`]
//! trailing bytes before giving up on it.

use encoding_rs::{EUC_KR, UTF_16BE, UTF_16LE};

type Decoder = fn(&[u8]) -> Option<String>;

/// Decoders in the order they are tried
pub(crate) const DECODERS: &[(&str, Decoder)] = &[
    ("utf-8", decode_utf8),
    ("cp949", decode_cp949),
    ("utf-16", decode_utf16),
    ("latin-1", decode_latin1),
];

/// Longest partial character at the end of a cut prefix (a UTF-8 lead plus
/// two continuation bytes, or a UTF-16 high surrogate plus one byte)
pub const MAX_PARTIAL_TAIL: usize = 3;

/// Decode `bytes` with the first decoder that succeeds.
pub fn decode_text(bytes: &[u8]) -> String {
    decode_text_named(bytes)
        .map(|(_, text)| text)
        .unwrap_or_default()
}

/// Like [`decode_text`], also naming the decoder that won.
pub fn decode_text_named(bytes: &[u8]) -> Option<(&'static str, String)> {
    decode_with_tail(bytes, 0)
}

/// Decode the leading bytes of a longer file.
pub fn decode_prefix(bytes: &[u8]) -> String {
    decode_with_tail(bytes, MAX_PARTIAL_TAIL)
        .map(|(_, text)| text)
        .unwrap_or_default()
}

fn decode_with_tail(bytes: &[u8], max_tail: usize) -> Option<(&'static str, String)> {
    DECODERS.iter().find_map(|(name, decode)| {
        (0..=max_tail.min(bytes.len())).find_map(|tail| {
            decode(&bytes[..bytes.len() - tail])
                .filter(|text| !text.is_empty())
                .map(|text| (*name, text))
        })
    })
}

/// UTF-8, with an optional byte order mark.
fn decode_utf8(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).ok().map(str::to_owned)
}

/// Korean Windows code page; encoding_rs's EUC-KR is the CP949 superset.
fn decode_cp949(bytes: &[u8]) -> Option<String> {
    EUC_KR
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

/// UTF-16 following the byte order mark, little-endian without one.
fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (encoding, body) = if let Some(rest) = bytes.strip_prefix(b"\xFF\xFE") {
        (UTF_16LE, rest)
    } else if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        (UTF_16BE, rest)
    } else {
        (UTF_16LE, bytes)
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
}

fn decode_latin1(bytes: &[u8]) -> Option<String> {
    Some(bytes.iter().map(|&b| b as char).collect())
}
