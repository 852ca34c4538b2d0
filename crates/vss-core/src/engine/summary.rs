//! Run-level statistics.

use std::collections::BTreeMap;

use crate::models::{ExtractionResult, ExtractionSummary, QualityTier};

/// Summarize per-field results.
pub fn build_summary(fields: &BTreeMap<String, ExtractionResult>) -> ExtractionSummary {
    let total_fields = fields.len();
    let success_count = fields.values().filter(|r| r.is_successful()).count();
    let high_quality_count = fields
        .values()
        .filter(|r| r.quality >= QualityTier::Good)
        .count();
    let moderate_quality_count = fields
        .values()
        .filter(|r| r.quality == QualityTier::Moderate)
        .count();

    let (success_rate, overall_quality_score) = if total_fields == 0 {
        (0.0, 0.0)
    } else {
        let total = total_fields as f64;
        (
            success_count as f64 / total,
            (high_quality_count as f64 + 0.5 * moderate_quality_count as f64) / total,
        )
    };

    ExtractionSummary {
        total_fields,
        success_count,
        failure_count: total_fields - success_count,
        success_rate,
        high_quality_count,
        moderate_quality_count,
        overall_quality_score,
        status: QualityTier::from_quality_score(overall_quality_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedValue;
    use pretty_assertions::assert_eq;

    fn result(field: &str, confidence: f64) -> ExtractionResult {
        let mut result = ExtractionResult::failed(field, "x");
        if confidence > 0.0 {
            result.value = Some(NormalizedValue::Raw("v".to_string()));
            result.confidence = confidence;
            result.quality = QualityTier::from_confidence(confidence);
            result.validation_errors.clear();
        }
        result
    }

    #[test]
    fn test_summary_counts() {
        let fields: BTreeMap<String, ExtractionResult> = [
            ("a", 1.0),
            ("b", 0.8),
            ("c", 0.6),
            ("d", 0.3),
            ("e", 0.0),
        ]
        .iter()
        .map(|(name, c)| (name.to_string(), result(name, *c)))
        .collect();

        let summary = build_summary(&fields);
        assert_eq!(summary.total_fields, 5);
        assert_eq!(summary.success_count, 4);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.success_rate, 0.8);
        assert_eq!(summary.high_quality_count, 2);
        assert_eq!(summary.moderate_quality_count, 1);
        assert!((summary.overall_quality_score - 0.5).abs() < 1e-9);
        assert_eq!(summary.status, QualityTier::Moderate);
    }

    #[test]
    fn test_empty_summary() {
        let summary = build_summary(&BTreeMap::new());
        assert_eq!(summary.total_fields, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.status, QualityTier::Poor);
    }
}
