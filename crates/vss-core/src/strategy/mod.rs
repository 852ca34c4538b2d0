//! Candidate extraction strategies.
//!
//! Each strategy inspects the document one way and proposes at most one raw
//! candidate per field. The arbiter runs them in a fixed order:
//! selector, regex, context, path and, only when all of those came up empty,
//! fallback.

pub mod context;
pub mod fallback;
pub mod path;
pub mod selector;
pub mod text_regex;

use regex::Regex;

use crate::document::ParsedDocument;
use crate::error::ExtractionError;
use crate::models::{Candidate, StrategyKind};
use crate::registry::FieldSpec;

pub use context::ContextStrategy;
pub use fallback::FallbackStrategy;
pub use path::PathStrategy;
pub use selector::SelectorStrategy;
pub use text_regex::RegexStrategy;

/// One way of finding a raw value in a document.
pub trait ExtractionStrategy: Send + Sync {
    /// Which strategy this is; determines the candidate weight.
    fn kind(&self) -> StrategyKind;

    /// Propose a candidate for `field`, or `None` when nothing matched.
    fn try_extract(
        &self,
        doc: &ParsedDocument,
        field: &str,
        spec: &FieldSpec,
    ) -> Result<Option<Candidate>, ExtractionError>;
}

/// First non-empty value of `pattern` in `text`.
///
/// The value is capture group 1 when the pattern has groups, else the whole
/// match. Values shorter than `min_chars` characters are skipped.
pub(crate) fn first_capture(pattern: &Regex, text: &str, min_chars: usize) -> Option<String> {
    let grouped = pattern.captures_len() > 1;
    pattern.captures_iter(text).find_map(|caps| {
        let m = if grouped { caps.get(1) } else { caps.get(0) };
        let value = m?.as_str().trim();
        (!value.is_empty() && value.chars().count() >= min_chars).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_capture_prefers_group() {
        let pattern = Regex::new(r"Tel:\s*(\d*)").unwrap();
        // The first match has an empty group and is skipped
        assert_eq!(
            first_capture(&pattern, "Tel: x Tel: 0912345678", 1).as_deref(),
            Some("0912345678")
        );

        let whole = Regex::new(r"\d{3}").unwrap();
        assert_eq!(first_capture(&whole, "ab 123", 1).as_deref(), Some("123"));
    }

    #[test]
    fn test_first_capture_min_length() {
        let pattern = Regex::new(r"\b[A-Z]+\b").unwrap();
        assert_eq!(first_capture(&pattern, "AB ACB", 3).as_deref(), Some("ACB"));
        assert_eq!(first_capture(&pattern, "AB", 3), None);
    }
}
