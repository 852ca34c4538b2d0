//! Loose last-resort patterns.

use tracing::debug;

use super::{first_capture, ExtractionStrategy};
use crate::document::ParsedDocument;
use crate::error::ExtractionError;
use crate::models::{Candidate, StrategyKind};
use crate::registry::FieldSpec;

/// Runs the field's fallback regexes, dropping too-short matches.
#[derive(Debug)]
pub struct FallbackStrategy {
    min_length: usize,
}

impl FallbackStrategy {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Default for FallbackStrategy {
    fn default() -> Self {
        Self::new(4)
    }
}

impl ExtractionStrategy for FallbackStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Fallback
    }

    fn try_extract(
        &self,
        doc: &ParsedDocument,
        field: &str,
        spec: &FieldSpec,
    ) -> Result<Option<Candidate>, ExtractionError> {
        for pattern in spec.fallbacks() {
            if let Some(value) = first_capture(pattern, doc.raw(), self.min_length) {
                debug!("{}: fallback pattern {} matched", field, pattern.as_str());
                return Ok(Some(Candidate::new(field, value, StrategyKind::Fallback)));
            }
        }
        Ok(None)
    }
}
