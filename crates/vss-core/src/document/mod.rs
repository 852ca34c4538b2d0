//! Document parsing and structural analysis.

pub mod analyzer;
pub mod text;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use crate::models::DocumentShape;

pub use analyzer::analyze_structure;

lazy_static! {
    static ref MARKUP: Regex = Regex::new(r"<[A-Za-z!/][^>]*>").unwrap();
}

/// A capped input document with its parsed tree and shape.
///
/// `scraper::Html` is not `Send`, so a document lives on the thread that
/// parsed it.
pub struct ParsedDocument {
    raw: String,
    tree: Option<Html>,
    text: String,
    shape: DocumentShape,
    truncated: bool,
}

impl ParsedDocument {
    /// Cap the input at `max_chars` characters and parse it.
    ///
    /// Input without any tag-like markup gets no tree and an all-zero shape.
    pub fn parse(input: &str, max_chars: usize) -> Self {
        let (raw, truncated) = match input.char_indices().nth(max_chars) {
            Some((cut, _)) => {
                warn!("Document exceeds {} characters, truncating", max_chars);
                (input[..cut].to_string(), true)
            }
            None => (input.to_string(), false),
        };

        if !MARKUP.is_match(&raw) {
            debug!("No markup found in {} bytes, skipping tree strategies", raw.len());
            return Self {
                text: raw.clone(),
                raw,
                tree: None,
                shape: DocumentShape::default(),
                truncated,
            };
        }

        let tree = Html::parse_document(&raw);
        if !tree.errors.is_empty() {
            debug!("Parser recovered from {} markup errors", tree.errors.len());
        }
        let text = visible_text(&tree);
        let shape = analyze_structure(&tree, text.chars().count());

        Self {
            raw,
            tree: Some(tree),
            text,
            shape,
            truncated,
        }
    }

    /// Capped document text, markup included.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed tree, absent for markup-free input.
    pub fn tree(&self) -> Option<&Html> {
        self.tree.as_ref()
    }

    /// Visible text (script and style bodies excluded), one text node per line.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn shape(&self) -> &DocumentShape {
        &self.shape
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

fn visible_text(tree: &Html) -> String {
    let mut lines = Vec::new();
    for node in tree.root_element().descendants() {
        let Some(content) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|parent| matches!(parent.value().name(), "script" | "style"));
        if hidden {
            continue;
        }
        let line = text::collapse_whitespace(content);
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShapeClass;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_has_no_tree() {
        let doc = ParsedDocument::parse("Điện thoại: 0912345678", 1000);
        assert!(doc.tree().is_none());
        assert_eq!(doc.text(), "Điện thoại: 0912345678");
        assert_eq!(doc.shape().element_count, 0);
        assert_eq!(doc.shape().shape_class, ShapeClass::Mixed);
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        let doc = ParsedDocument::parse("Điện thoại", 3);
        assert_eq!(doc.raw(), "Điệ");
        assert!(doc.is_truncated());

        let doc = ParsedDocument::parse("abc", 3);
        assert_eq!(doc.raw(), "abc");
        assert!(!doc.is_truncated());
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let doc = ParsedDocument::parse(
            r#"<html><head><script>var x = {"a": 1};</script></head><body><p>Xin chào</p></body></html>"#,
            1000,
        );
        assert_eq!(doc.text(), "Xin chào");
        assert!(doc.shape().has_embedded_structured_data);
    }
}
