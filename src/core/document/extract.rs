//! Extension-based dispatch to the format readers.

use super::{compound, encoding, office, pdf, DocumentFormats};
use crate::error::DocumentError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Worst-case bytes per character (4-byte UTF-8, UTF-16 surrogate pairs)
const MAX_BYTES_PER_CHAR: usize = 4;
/// Room for a byte order mark ahead of the text
const BOM_ALLOWANCE: usize = 4;

/// Which reader handles a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Compound,
    PlainText,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("pdf") => DocumentKind::Pdf,
            Some("docx") => DocumentKind::Docx,
            Some("hwp") => DocumentKind::Compound,
            _ => DocumentKind::PlainText,
        }
    }
}

/// Text of `path`, at most `max_chars` characters, trimmed.
///
/// Never fails: unreadable or malformed files give an empty string. A file
/// whose reader is switched off in `formats` is read as plain text.
pub fn extract_text_with(path: &Path, max_chars: usize, formats: &DocumentFormats) -> String {
    let mut kind = DocumentKind::from_path(path);
    if !formats.supports(kind) {
        tracing::debug!("{:?} reader is disabled, reading {} as text", kind, path.display());
        kind = DocumentKind::PlainText;
    }

    let raw = match kind {
        DocumentKind::Pdf => pdf::extract(path),
        DocumentKind::Docx => office::extract(path, max_chars),
        DocumentKind::Compound => compound::extract(path),
        DocumentKind::PlainText => read_plain_text(path, max_chars),
    };

    match raw {
        Ok(text) => truncate_chars(&text, max_chars).trim().to_string(),
        Err(e) => {
            tracing::warn!("Text extraction failed: {}", e);
            String::new()
        }
    }
}

/// Decode only the leading bytes that can hold `max_chars` characters.
fn read_plain_text(path: &Path, max_chars: usize) -> Result<String, DocumentError> {
    let io_error = |source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    };

    let limit = max_chars.saturating_mul(MAX_BYTES_PER_CHAR).saturating_add(BOM_ALLOWANCE);
    let mut bytes = Vec::new();
    File::open(path)
        .map_err(io_error)?
        .take(limit as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(io_error)?;

    if bytes.len() > limit {
        bytes.truncate(limit);
        Ok(encoding::decode_prefix(&bytes))
    } else {
        Ok(encoding::decode_text(&bytes))
    }
}

/// The first `max_chars` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn kind_follows_lowercased_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("a/Report.PDF")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("memo.docx")), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_path(Path::new("draft.HWP")), DocumentKind::Compound);
        assert_eq!(DocumentKind::from_path(Path::new("movie.srt")), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_path(Path::new("README")), DocumentKind::PlainText);
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("안녕하세요", 2), "안녕");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn plain_text_is_truncated_then_trimmed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        std::fs::write(&path, "  hello world  ").unwrap();

        assert_eq!(extract_text_with(&path, 8, &DocumentFormats::default()), "hello");
    }

    #[test]
    fn missing_file_gives_empty_text() {
        let text = extract_text_with(Path::new("/nonexistent/notes.txt"), 100, &DocumentFormats::default());
        assert_eq!(text, "");
    }

    #[test]
    fn disabled_format_is_read_as_text() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fake.pdf");
        std::fs::write(&path, "plain text in disguise").unwrap();

        let formats = DocumentFormats {
            pdf: false,
            ..DocumentFormats::default()
        };
        assert_eq!(extract_text_with(&path, 100, &formats), "plain text in disguise");
        assert_eq!(extract_text_with(&path, 100, &DocumentFormats::default()), "");
    }

    #[test]
    fn bad_bytes_past_the_limit_do_not_change_the_encoding() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("subtitle.srt");
        let mut bytes = "안녕하세요 ".repeat(1000).into_bytes();
        bytes.extend_from_slice(&[0xFF, 0x20]);
        std::fs::write(&path, &bytes).unwrap();

        let text = extract_text_with(&path, 30, &DocumentFormats::default());

        assert_eq!(text, "안녕하세요 ".repeat(5).trim_end());
    }

    #[test]
    fn prefix_cut_inside_a_character_still_decodes_as_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.md");
        // 3-byte characters; the 16-byte limit for 3 chars ends mid-character
        std::fs::write(&path, "가".repeat(50)).unwrap();

        assert_eq!(extract_text_with(&path, 3, &DocumentFormats::default()), "가가가");
    }
}
