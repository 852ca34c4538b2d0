//! Context-keyword strategy: the value sits next to its label.

use scraper::ElementRef;
use tracing::trace;

use super::ExtractionStrategy;
use crate::document::text::element_text;
use crate::document::ParsedDocument;
use crate::error::ExtractionError;
use crate::models::{Candidate, StrategyKind};
use crate::registry::FieldSpec;

/// Finds label text nodes and reads the nearest element after them.
#[derive(Debug, Default)]
pub struct ContextStrategy;

impl ExtractionStrategy for ContextStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Context
    }

    fn try_extract(
        &self,
        doc: &ParsedDocument,
        field: &str,
        spec: &FieldSpec,
    ) -> Result<Option<Candidate>, ExtractionError> {
        let Some(html) = doc.tree() else {
            return Ok(None);
        };

        for keyword in spec.context_keywords() {
            for node in html.root_element().descendants() {
                let Some(text) = node.value().as_text() else {
                    continue;
                };
                if !text.to_lowercase().contains(keyword.as_str()) {
                    continue;
                }
                let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
                    continue;
                };
                if matches!(parent.value().name(), "script" | "style") {
                    continue;
                }

                if let Some(value) = value_near(parent, keyword) {
                    trace!("{}: context keyword '{}' matched", field, keyword);
                    return Ok(Some(Candidate::new(field, value, StrategyKind::Context)));
                }
            }
        }
        Ok(None)
    }
}

/// First following sibling of `label` with usable text, else the first
/// usable descendant of its parent.
fn value_near(label: ElementRef<'_>, keyword: &str) -> Option<String> {
    let usable = |text: &String| !text.is_empty() && !text.to_lowercase().contains(keyword);

    if let Some(value) = label
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .map(element_text)
        .find(usable)
    {
        return Some(value);
    }

    let container = label.parent().and_then(ElementRef::wrap)?;
    container
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.id() != container.id() && e.id() != label.id())
        .map(element_text)
        .find(usable)
}
