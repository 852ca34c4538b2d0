//! Structural selector strategy.

use tracing::trace;

use super::ExtractionStrategy;
use crate::document::text::{cells, element_text};
use crate::document::ParsedDocument;
use crate::error::ExtractionError;
use crate::models::{Candidate, StrategyKind};
use crate::registry::FieldSpec;

/// Separator between element texts of a multi-valued candidate.
pub const VALUE_SEPARATOR: &str = " | ";

/// Runs the field's selectors in order; the first one with text wins.
#[derive(Debug, Default)]
pub struct SelectorStrategy;

impl ExtractionStrategy for SelectorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Selector
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

        for pattern in spec.selectors() {
            let elements = pattern.select(html);
            let text = match elements.as_slice() {
                [] => continue,
                [single] if spec.is_multi_valued() => element_text(*single),
                _ if spec.is_multi_valued() => elements
                    .iter()
                    .map(|e| element_text(*e))
                    .filter(|t| !t.is_empty() && !is_header(t, spec.header_tokens()))
                    .collect::<Vec<_>>()
                    .join(VALUE_SEPARATOR),
                _ => elements
                    .iter()
                    .map(|e| element_text(*e))
                    .find(|t| !t.is_empty())
                    .unwrap_or_default(),
            };

            if !text.trim().is_empty() {
                trace!("{}: selector {} matched", field, pattern.source());
                return Ok(Some(Candidate::new(field, text, StrategyKind::Selector)));
            }
        }
        Ok(None)
    }
}

/// A row where any cell is a header label.
fn is_header(text: &str, tokens: &[String]) -> bool {
    cells(text).into_iter().any(|cell| {
        let cell = cell.trim_end_matches(':').trim().to_lowercase();
        tokens.iter().any(|t| *t == cell)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FieldPatterns, PatternRegistry};
    use pretty_assertions::assert_eq;

    fn run(html: &str, field: &str) -> Option<Candidate> {
        let registry = PatternRegistry::with_defaults().unwrap();
        let doc = ParsedDocument::parse(html, 100_000);
        SelectorStrategy
            .try_extract(&doc, field, registry.get_spec(field).unwrap())
            .unwrap()
    }

    #[test]
    fn test_label_cell_sibling() {
        let html = r#"<table>
            <tr><td>Điện thoại liên hệ:</td><td> 0912 345 678 </td></tr>
        </table>"#;
        let candidate = run(html, "phone").unwrap();
        assert_eq!(candidate.raw, "0912 345 678");
        assert_eq!(candidate.strategy, StrategyKind::Selector);
        assert_eq!(candidate.weight, 1.0);
    }

    #[test]
    fn test_input_value() {
        let html = r#"<form><input type="tel" name="phone" value="0123456789"></form>"#;
        assert_eq!(run(html, "phone").unwrap().raw, "0123456789");
    }

    #[test]
    fn test_empty_match_falls_through_to_next_selector() {
        let html = r#"<div>
            <span class="phone"></span>
            <div class="field-phone"><span class="value">0987654321</span></div>
        </div>"#;
        assert_eq!(run(html, "phone").unwrap().raw, "0987654321");
    }

    #[test]
    fn test_multi_valued_rows_skip_header() {
        let html = r#"<table class="family-table">
            <tr><th>Họ tên</th><th>Quan hệ</th><th>Năm sinh</th></tr>
            <tr><td>Trần Thị Bình</td><td>Vợ</td><td>1987</td></tr>
            <tr><td>Nguyễn Văn Cường</td><td>Con</td><td>2015</td></tr>
        </table>"#;
        let candidate = run(html, "members").unwrap();
        assert_eq!(
            candidate.raw,
            "Trần Thị Bình\tVợ\t1987 | Nguyễn Văn Cường\tCon\t2015"
        );
    }

    #[test]
    fn test_no_tree_no_candidate() {
        assert_eq!(run("Điện thoại: 0912345678", "phone"), None);
    }

    #[test]
    fn test_single_valued_takes_first_non_empty() {
        let spec = crate::registry::FieldSpec::compile(
            "note",
            FieldPatterns {
                selectors: vec!["p".to_string()],
                ..Default::default()
            },
        )
        .unwrap();
        let doc = ParsedDocument::parse("<p> </p><p>first</p><p>second</p>", 1000);
        let candidate = SelectorStrategy.try_extract(&doc, "note", &spec).unwrap().unwrap();
        assert_eq!(candidate.raw, "first");
    }
}
