//! Regex strategy over the raw document.

use tracing::trace;

use super::{first_capture, ExtractionStrategy};
use crate::document::ParsedDocument;
use crate::error::ExtractionError;
use crate::models::{Candidate, StrategyKind};
use crate::registry::FieldSpec;

/// Tries the field's regexes in order against the raw (capped) document.
#[derive(Debug, Default)]
pub struct RegexStrategy;

impl ExtractionStrategy for RegexStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Regex
    }

    fn try_extract(
        &self,
        doc: &ParsedDocument,
        field: &str,
        spec: &FieldSpec,
    ) -> Result<Option<Candidate>, ExtractionError> {
        for pattern in spec.regexes() {
            if let Some(value) = first_capture(pattern, doc.raw(), 1) {
                trace!("{}: regex {} matched", field, pattern.as_str());
                return Ok(Some(Candidate::new(field, value, StrategyKind::Regex)));
            }
        }
        Ok(None)
    }
}
