//! Constrained path-traversal strategy.

use scraper::ElementRef;
use tracing::trace;

use super::ExtractionStrategy;
use crate::document::text::{element_text, own_text};
use crate::document::ParsedDocument;
use crate::error::ExtractionError;
use crate::models::{Candidate, StrategyKind};
use crate::registry::FieldSpec;

/// Executes `//TAG[contains(text(),"X")]/following-sibling::TAG[1]`.
///
/// Other path shapes are skipped.
#[derive(Debug, Default)]
pub struct PathStrategy;

impl ExtractionStrategy for PathStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Path
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

        for path in spec.paths() {
            let Some(sibling) = path.sibling() else {
                trace!("{}: skipping unsupported path {}", field, path.source());
                continue;
            };

            for anchor in html.select(&sibling.tag) {
                if !own_text(anchor).to_lowercase().contains(&sibling.text) {
                    continue;
                }
                let next = anchor
                    .next_siblings()
                    .filter_map(ElementRef::wrap)
                    .find(|e| e.value().name() == sibling.tag_name);
                let Some(next) = next else {
                    continue;
                };
                let text = element_text(next);
                if !text.is_empty() {
                    trace!("{}: path {} matched", field, path.source());
                    return Ok(Some(Candidate::new(field, text, StrategyKind::Path)));
                }
            }
        }
        Ok(None)
    }
}
