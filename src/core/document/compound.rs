//! Text from compound-file (OLE) word-processor documents.
//!
//! Body text lives in `BodyText/Section0`, `BodyText/Section1`, ... streams,
//! usually raw-deflated UTF-16LE.

use crate::error::DocumentError;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path};

/// Compound file signature
pub const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const BODY_STORAGE: &str = "BodyText";

type Inflate = fn(&[u8]) -> io::Result<Vec<u8>>;

/// Decompression strategies, tried in order
pub(crate) const INFLATERS: &[(&str, Inflate)] = &[
    ("raw deflate", inflate_raw),
    ("zlib", inflate_zlib),
    ("stored", passthrough),
];

pub fn is_compound_file(path: &Path) -> io::Result<bool> {
    let mut magic = [0u8; 8];
    let mut file = File::open(path)?;
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == OLE_MAGIC),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Concatenated body sections. Files without the compound signature give `""`.
pub fn extract(path: &Path) -> Result<String, DocumentError> {
    let format_error = |reason: String| DocumentError::Format {
        path: path.to_path_buf(),
        reason,
    };

    let is_compound = is_compound_file(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if !is_compound {
        tracing::debug!("{} is not a compound file", path.display());
        return Ok(String::new());
    }

    let mut container = cfb::open(path).map_err(|e| format_error(e.to_string()))?;

    let mut sections: Vec<String> = container
        .walk()
        .filter(|entry| entry.is_stream())
        .filter_map(|entry| body_section(entry.path()))
        .collect();
    sections.sort();

    let mut text = String::new();
    for section in sections {
        let stream_path = format!("/{}/{}", BODY_STORAGE, section);
        let mut raw = Vec::new();
        container
            .open_stream(&stream_path)
            .and_then(|mut stream| stream.read_to_end(&mut raw))
            .map_err(|e| format_error(format!("{}: {}", stream_path, e)))?;

        let unpacked = inflate(&raw);
        text.push_str(&decode_utf16le_lossless(&unpacked).replace('\r', "\n").replace('\0', ""));
        text.push('\n');
    }

    Ok(text)
}

/// Second path component of a stream under `BodyText`.
fn body_section(path: &Path) -> Option<String> {
    let mut names = path.components().filter_map(|component| match component {
        Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    });

    match (names.next(), names.next()) {
        (Some(first), Some(second)) if first == BODY_STORAGE => Some(second),
        _ => None,
    }
}

/// Output of the first strategy that succeeds.
pub(crate) fn inflate(raw: &[u8]) -> Vec<u8> {
    for (name, strategy) in INFLATERS {
        match strategy(raw) {
            Ok(unpacked) => {
                tracing::trace!("Section unpacked with {}", name);
                return unpacked;
            }
            Err(e) => tracing::trace!("{} failed: {}", name, e),
        }
    }
    raw.to_vec()
}

fn inflate_raw(raw: &[u8]) -> io::Result<Vec<u8>> {
    let mut unpacked = Vec::new();
    DeflateDecoder::new(raw).read_to_end(&mut unpacked)?;
    Ok(unpacked)
}

fn inflate_zlib(raw: &[u8]) -> io::Result<Vec<u8>> {
    let mut unpacked = Vec::new();
    ZlibDecoder::new(raw).read_to_end(&mut unpacked)?;
    Ok(unpacked)
}

fn passthrough(raw: &[u8]) -> io::Result<Vec<u8>> {
    Ok(raw.to_vec())
}

/// UTF-16LE, silently dropping unpaired surrogates and a trailing odd byte.
fn decode_utf16le_lossless(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units).filter_map(Result::ok).collect()
}
