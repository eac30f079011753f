use crate::error::DocumentError;
use lopdf::Document;
use std::path::Path;

/// Only the leading pages are read
pub const MAX_PAGES: usize = 5;

/// Concatenated text of the first [`MAX_PAGES`] pages.
pub fn extract(path: &Path) -> Result<String, DocumentError> {
    let format_error = |reason: String| DocumentError::Format {
        path: path.to_path_buf(),
        reason,
    };

    let document = Document::load(path).map_err(|e| format_error(e.to_string()))?;

    let mut text = String::new();
    for page in document.get_pages().keys().take(MAX_PAGES) {
        let page_text = document
            .extract_text(&[*page])
            .map_err(|e| format_error(format!("page {}: {}", page, e)))?;
        text.push_str(&page_text);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use tempfile::TempDir;

    /// One Courier line per page: "PAGE1", "PAGE2", ...
    fn write_pdf(path: &Path, pages: usize) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for number in 1..=pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("PAGE{}", number))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn reads_pages_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("short.pdf");
        write_pdf(&path, 2);

        let text = extract(&path).unwrap();

        let first = text.find("PAGE1").unwrap();
        let second = text.find("PAGE2").unwrap();
        assert!(first < second);
    }

    #[test]
    fn stops_after_five_pages() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.pdf");
        write_pdf(&path, 7);

        let text = extract(&path).unwrap();

        for number in 1..=MAX_PAGES {
            assert!(text.contains(&format!("PAGE{}", number)), "page {} missing", number);
        }
        assert!(!text.contains("PAGE6"));
        assert!(!text.contains("PAGE7"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(extract(Path::new("/nonexistent/doc.pdf")).is_err());
    }

    #[test]
    fn garbage_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4\nthis is not a pdf body").unwrap();

        assert!(matches!(extract(&path), Err(DocumentError::Format { .. })));
    }
}
