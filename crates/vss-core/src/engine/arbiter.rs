//! Strategy ordering, candidate selection and confidence scoring.

use tracing::trace;

use crate::document::ParsedDocument;
use crate::error::ExtractionError;
use crate::fields::Normalized;
use crate::models::{Candidate, ExtractionConfig};
use crate::registry::FieldSpec;
use crate::strategy::{
    ContextStrategy, ExtractionStrategy, FallbackStrategy, PathStrategy, RegexStrategy,
    SelectorStrategy,
};

/// The winning candidate with its normalized value.
#[derive(Debug, Clone)]
pub struct Selection {
    pub candidate: Candidate,
    /// Base weight plus any data-presence bonus.
    pub weight: f64,
    pub normalized: Normalized,
}

/// Runs strategies in order and picks the best candidate.
pub struct Arbiter {
    primary: Vec<Box<dyn ExtractionStrategy>>,
    fallback: Box<dyn ExtractionStrategy>,
    data_presence_bonus: f64,
}

impl Arbiter {
    /// Selector, regex, context and path, with the configured fallback.
    pub fn standard(config: &ExtractionConfig) -> Self {
        Self::new(
            vec![
                Box::new(SelectorStrategy),
                Box::new(RegexStrategy),
                Box::new(ContextStrategy),
                Box::new(PathStrategy),
            ],
            Box::new(FallbackStrategy::new(config.fallback_min_length)),
            config.data_presence_bonus,
        )
    }

    pub fn new(
        primary: Vec<Box<dyn ExtractionStrategy>>,
        fallback: Box<dyn ExtractionStrategy>,
        data_presence_bonus: f64,
    ) -> Self {
        Self {
            primary,
            fallback,
            data_presence_bonus,
        }
    }

    /// One candidate per primary strategy that matched, in strategy order.
    /// The fallback only runs when none did.
    pub fn collect(
        &self,
        doc: &ParsedDocument,
        spec: &FieldSpec,
    ) -> Result<Vec<Candidate>, ExtractionError> {
        let mut candidates = Vec::new();
        for strategy in &self.primary {
            if let Some(candidate) = strategy.try_extract(doc, spec.name(), spec)? {
                trace!(
                    "{}: {} proposed {:?}",
                    spec.name(),
                    strategy.kind(),
                    candidate.raw
                );
                candidates.push(candidate);
            }
        }
        if candidates.is_empty() {
            if let Some(candidate) = self.fallback.try_extract(doc, spec.name(), spec)? {
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }

    /// Pick the winner among `candidates`.
    ///
    /// Single-valued fields take the highest weight, ties going to the
    /// earliest strategy. Multi-valued fields prefer candidates whose
    /// normalized value is non-empty and add the data-presence bonus.
    pub fn select<F>(
        &self,
        candidates: Vec<Candidate>,
        multi_valued: bool,
        normalize: F,
    ) -> Option<Selection>
    where
        F: Fn(&Candidate) -> Normalized,
    {
        if !multi_valued {
            let best = highest(candidates.iter().map(|c| (c, c.weight)))?;
            let normalized = normalize(best);
            return Some(Selection {
                weight: best.weight,
                candidate: best.clone(),
                normalized,
            });
        }

        let normalized: Vec<(Candidate, Normalized)> = candidates
            .into_iter()
            .map(|c| {
                let n = normalize(&c);
                (c, n)
            })
            .collect();

        let with_data = highest(
            normalized
                .iter()
                .filter(|(_, n)| !n.value.is_empty())
                .map(|pair| (pair, pair.0.weight + self.data_presence_bonus)),
        );
        if let Some((candidate, n)) = with_data {
            return Some(Selection {
                weight: candidate.weight + self.data_presence_bonus,
                candidate: candidate.clone(),
                normalized: n.clone(),
            });
        }

        let (candidate, n) = highest(normalized.iter().map(|pair| (pair, pair.0.weight)))?;
        Some(Selection {
            weight: candidate.weight,
            candidate: candidate.clone(),
            normalized: n.clone(),
        })
    }
}

/// Highest-weight item; the earliest wins ties.
fn highest<T>(items: impl Iterator<Item = (T, f64)>) -> Option<T> {
    let mut best: Option<(T, f64)> = None;
    for (item, weight) in items {
        if best.as_ref().is_none_or(|(_, w)| weight > *w) {
            best = Some((item, weight));
        }
    }
    best.map(|(item, _)| item)
}

/// `weight - penalty × errors`, clamped to [0, 1].
pub fn score(weight: f64, error_count: usize, penalty: f64) -> f64 {
    (weight - penalty * error_count as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Member, NormalizedValue, StrategyKind};
    use pretty_assertions::assert_eq;

    fn arbiter() -> Arbiter {
        Arbiter::standard(&ExtractionConfig::default())
    }

    fn raw(candidate: &Candidate) -> Normalized {
        Normalized {
            value: NormalizedValue::Raw(candidate.raw.clone()),
            steps: vec![],
        }
    }

    #[test]
    fn test_highest_weight_wins() {
        let candidates = vec![
            Candidate::new("f", "context", StrategyKind::Context),
            Candidate::new("f", "regex", StrategyKind::Regex),
            Candidate::new("f", "path", StrategyKind::Path),
        ];
        let selection = arbiter().select(candidates, false, raw).unwrap();
        // Regex and path tie at 0.9; regex ran first
        assert_eq!(selection.candidate.raw, "regex");
        assert_eq!(selection.weight, 0.9);
    }

    #[test]
    fn test_multi_valued_prefers_data() {
        let candidates = vec![
            Candidate::new("members", "header only", StrategyKind::Selector),
            Candidate::new("members", "Vợ: Trần Thị Bình", StrategyKind::Context),
        ];
        let normalize = |c: &Candidate| Normalized {
            value: if c.raw.contains(':') {
                NormalizedValue::MemberList(vec![Member::new("Trần Thị Bình", "Vợ", None)])
            } else {
                NormalizedValue::MemberList(vec![])
            },
            steps: vec![],
        };

        let selection = arbiter().select(candidates.clone(), true, normalize).unwrap();
        assert_eq!(selection.candidate.strategy, StrategyKind::Context);
        assert!((selection.weight - 1.0).abs() < 1e-9);

        // With no data anywhere the raw weight decides
        let empty = |_: &Candidate| Normalized {
            value: NormalizedValue::MemberList(vec![]),
            steps: vec![],
        };
        let selection = arbiter().select(candidates, true, empty).unwrap();
        assert_eq!(selection.candidate.strategy, StrategyKind::Selector);
        assert_eq!(selection.weight, 1.0);
    }

    #[test]
    fn test_no_candidates() {
        assert!(arbiter().select(vec![], false, raw).is_none());
        assert!(arbiter().select(vec![], true, raw).is_none());
    }

    #[test]
    fn test_score() {
        assert_eq!(score(1.0, 0, 0.1), 1.0);
        assert!((score(0.9, 2, 0.1) - 0.7).abs() < 1e-9);
        assert_eq!(score(1.2, 0, 0.1), 1.0);
        assert_eq!(score(0.5, 10, 0.1), 0.0);
    }

    #[test]
    fn test_fallback_only_when_primary_empty() {
        let registry = crate::registry::PatternRegistry::with_defaults().unwrap();
        let spec = registry.get_spec("phone").unwrap();

        let doc = ParsedDocument::parse("gọi 0912345678", 1000);
        let candidates = arbiter().collect(&doc, spec).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].strategy, StrategyKind::Regex);

        // Four-letter prefixes only match the loose household pattern
        let spec = registry.get_spec("household_code").unwrap();
        let doc = ParsedDocument::parse("số ABCD12345678", 1000);
        let candidates = arbiter().collect(&doc, spec).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].strategy, StrategyKind::Fallback);
    }
}
