//! Body paragraphs of Office Open XML word-processing documents.

use crate::error::DocumentError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraph texts of the document body, each followed by `\n`.
///
/// Paragraphs inside tables, text boxes and other nested containers are
/// skipped. Stops after the paragraph that takes the text past `max_chars`.
pub fn extract(path: &Path, max_chars: usize) -> Result<String, DocumentError> {
    let format_error = |reason: String| DocumentError::Format {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| format_error(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| format_error(format!("{}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| format_error(format!("{}: {}", DOCUMENT_PART, e)))?;

    body_paragraphs(&xml, max_chars).map_err(format_error)
}

/// Where the reader currently is relative to a body paragraph
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    /// `w:body`
    Body,
    /// A `w:p` directly under the body
    Paragraph,
    /// `w:hyperlink` inside a body paragraph
    Hyperlink,
    /// `w:r` belonging to a body paragraph
    Run,
    /// `w:t` inside such a run
    Text,
    /// Anything else
    Other,
}

fn body_paragraphs(xml: &str, max_chars: usize) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Scope> = Vec::new();
    let mut text = String::new();
    let mut chars = 0usize;
    let mut paragraph = String::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(element) => {
                let parent = stack.last().copied();
                let scope = match (parent, element.name().as_ref()) {
                    (_, b"w:body") => Scope::Body,
                    (Some(Scope::Body), b"w:p") => Scope::Paragraph,
                    (Some(Scope::Paragraph), b"w:hyperlink") => Scope::Hyperlink,
                    (Some(Scope::Paragraph | Scope::Hyperlink), b"w:r") => Scope::Run,
                    (Some(Scope::Run), b"w:t") => Scope::Text,
                    _ => Scope::Other,
                };
                if scope == Scope::Paragraph {
                    paragraph.clear();
                }
                stack.push(scope);
            }
            Event::Empty(element) => match (stack.last(), element.name().as_ref()) {
                (Some(Scope::Run), b"w:tab") => paragraph.push('\t'),
                (Some(Scope::Run), b"w:br" | b"w:cr") => paragraph.push('\n'),
                (Some(Scope::Body), b"w:p") => {
                    chars += 1;
                    text.push('\n');
                    if chars > max_chars {
                        break;
                    }
                }
                _ => {}
            },
            Event::Text(content) => {
                if stack.last() == Some(&Scope::Text) {
                    let unescaped = content.unescape().map_err(|e| e.to_string())?;
                    paragraph.push_str(&unescaped);
                }
            }
            Event::End(_) => {
                if stack.pop() == Some(Scope::Paragraph) {
                    chars += paragraph.chars().count() + 1;
                    text.push_str(&paragraph);
                    text.push('\n');
                    if chars > max_chars {
                        break;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}
