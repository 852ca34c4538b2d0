//! Per-field results and the report returned by one extraction call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::value::{NormalizedValue, StrategyKind};
use crate::error::{Result, VssError};

/// Quality tier derived from confidence. Ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Failed,
    Poor,
    Moderate,
    Good,
    Excellent,
}

impl QualityTier {
    /// Map a field confidence to its tier.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            QualityTier::Excellent
        } else if confidence >= 0.7 {
            QualityTier::Good
        } else if confidence >= 0.5 {
            QualityTier::Moderate
        } else if confidence > 0.0 {
            QualityTier::Poor
        } else {
            QualityTier::Failed
        }
    }

    /// Map a run-level quality score to a status.
    ///
    /// Thresholds are stricter than the field ones and never yield `Failed`.
    pub fn from_quality_score(score: f64) -> Self {
        if score > 0.8 {
            QualityTier::Excellent
        } else if score > 0.6 {
            QualityTier::Good
        } else if score > 0.3 {
            QualityTier::Moderate
        } else {
            QualityTier::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Failed => "failed",
            QualityTier::Poor => "poor",
            QualityTier::Moderate => "moderate",
            QualityTier::Good => "good",
            QualityTier::Excellent => "excellent",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Field name from the registry.
    pub field: String,
    /// Normalized value, absent when nothing matched.
    pub value: Option<NormalizedValue>,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub quality: QualityTier,
    /// Strategy of the winning candidate.
    pub strategy: Option<StrategyKind>,
    /// Whether the winning candidate came from the fallback strategy.
    pub fallback_used: bool,
    pub validation_errors: Vec<String>,
    pub validation_warnings: Vec<String>,
    /// Normalization trace; the first entry is always the raw candidate.
    pub normalization_steps: Vec<String>,
    pub quality_metrics: QualityMetrics,
}

impl ExtractionResult {
    /// A failed result carrying a single error message.
    pub fn failed(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: None,
            confidence: 0.0,
            quality: QualityTier::Failed,
            strategy: None,
            fallback_used: false,
            validation_errors: vec![message.into()],
            validation_warnings: Vec::new(),
            normalization_steps: Vec::new(),
            quality_metrics: QualityMetrics::assess(0.0, false, 1, false),
        }
    }

    /// A field counts as extracted when it has a value and did not score zero.
    pub fn is_successful(&self) -> bool {
        self.value.is_some() && self.quality != QualityTier::Failed
    }
}

/// Weighted per-field quality breakdown.
///
/// `overall_score` = 0.4 × confidence + 0.3 × completeness
/// + 0.2 × validation + 0.1 × method reliability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// 1.0 when a value was extracted.
    pub data_completeness: f64,
    /// 1.0 minus 0.2 per validation error, floored at 0.
    pub validation_score: f64,
    /// 0.8 for a targeted strategy, 0.4 for the fallback.
    pub method_reliability: f64,
    pub overall_score: f64,
}

impl QualityMetrics {
    pub fn assess(
        confidence: f64,
        has_value: bool,
        validation_errors: usize,
        fallback_used: bool,
    ) -> Self {
        let data_completeness = if has_value { 1.0 } else { 0.0 };
        let validation_score = (1.0 - validation_errors as f64 * 0.2).max(0.0);
        let method_reliability = if fallback_used { 0.4 } else { 0.8 };
        let overall_score = confidence * 0.4
            + data_completeness * 0.3
            + validation_score * 0.2
            + method_reliability * 0.1;

        Self {
            data_completeness,
            validation_score,
            method_reliability,
            overall_score,
        }
    }
}

/// Cross-check verdict for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossCheckStatus {
    Match,
    Mismatch,
    /// The reference record has no key for the field.
    NoReference,
    /// The reference has a value but extraction failed.
    NotExtracted,
}

/// Agreement between an extracted field and the reference record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationRecord {
    pub field: String,
    pub reference_key: Option<String>,
    pub reference_value: Option<String>,
    pub extracted_value: Option<String>,
    /// Similarity in [0, 1].
    pub similarity: f64,
    pub is_consistent: bool,
    pub status: CrossCheckStatus,
    pub notes: String,
}

/// Cross-check outcome for all fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationReport {
    pub records: BTreeMap<String, CrossValidationRecord>,
    /// Share of compared fields (with a reference key) that are consistent.
    /// 1.0 when no field could be compared.
    pub overall_consistency: f64,
    /// Fields whose comparison failed.
    pub inconsistencies: Vec<String>,
}

/// Run-level statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub total_fields: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub success_rate: f64,
    /// Fields at `Excellent` or `Good`.
    pub high_quality_count: usize,
    /// Fields at `Moderate`.
    pub moderate_quality_count: usize,
    /// (high + 0.5 × moderate) / total.
    pub overall_quality_score: f64,
    pub status: QualityTier,
}

/// Coarse classification of a document layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeClass {
    TableBased,
    FormBased,
    DivBased,
    Mixed,
}

impl ShapeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeClass::TableBased => "table_based",
            ShapeClass::FormBased => "form_based",
            ShapeClass::DivBased => "div_based",
            ShapeClass::Mixed => "mixed",
        }
    }
}

/// Structural metadata about a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentShape {
    pub element_count: usize,
    pub table_count: usize,
    pub div_count: usize,
    pub span_count: usize,
    pub form_count: usize,
    pub input_count: usize,
    /// A `<script>` holds a `{ ... }` block.
    pub has_embedded_structured_data: bool,
    /// Characters of visible text.
    pub text_length: usize,
    pub shape_class: ShapeClass,
}

impl Default for DocumentShape {
    fn default() -> Self {
        Self {
            element_count: 0,
            table_count: 0,
            div_count: 0,
            span_count: 0,
            form_count: 0,
            input_count: 0,
            has_embedded_structured_data: false,
            text_length: 0,
            shape_class: ShapeClass::Mixed,
        }
    }
}

/// Provenance of one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Engine name and version, e.g. "vss-core/0.1.0".
    pub engine: String,
    pub extracted_at: DateTime<Utc>,
    pub reference_provided: bool,
}

impl ExtractionMetadata {
    pub fn now(reference_provided: bool) -> Self {
        Self {
            engine: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            extracted_at: Utc::now(),
            reference_provided,
        }
    }
}

/// Everything one extraction call produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub metadata: ExtractionMetadata,
    pub document_shape: DocumentShape,
    /// The input exceeded the configured size cap and was cut.
    pub input_truncated: bool,
    /// One result per registered field.
    pub fields: BTreeMap<String, ExtractionResult>,
    /// Present only when a reference record was supplied.
    pub cross_validation: Option<CrossValidationReport>,
    pub summary: ExtractionSummary,
}

impl ExtractionReport {
    pub fn field(&self, name: &str) -> Option<&ExtractionResult> {
        self.fields.get(name)
    }
}

/// Flat key/value record supplied by the caller for cross-checking.
///
/// Keys are trimmed and lowercased on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceRecord(BTreeMap<String, String>);

impl ReferenceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.0.insert(key.as_ref().trim().to_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.trim().to_lowercase()).map(String::as_str)
    }

    /// First key from `keys` that is present with a non-blank value.
    pub fn first_of<'a>(&'a self, keys: &'a [String]) -> Option<(&'a str, &'a str)> {
        keys.iter().find_map(|k| {
            self.get(k)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (k.as_str(), v))
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build a record from a JSON object, stringifying scalar values.
    ///
    /// Nulls are skipped; arrays and nested objects keep their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            VssError::Config("reference record must be a JSON object".to_string())
        })?;

        let mut record = Self::new();
        for (key, value) in object {
            let text = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                other => serde_json::to_string(other)?,
            };
            record.insert(key, text);
        }
        Ok(record)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ReferenceRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(QualityTier::from_confidence(1.0), QualityTier::Excellent);
        assert_eq!(QualityTier::from_confidence(0.9), QualityTier::Excellent);
        assert_eq!(QualityTier::from_confidence(0.89), QualityTier::Good);
        assert_eq!(QualityTier::from_confidence(0.7), QualityTier::Good);
        assert_eq!(QualityTier::from_confidence(0.5), QualityTier::Moderate);
        assert_eq!(QualityTier::from_confidence(0.01), QualityTier::Poor);
        assert_eq!(QualityTier::from_confidence(0.0), QualityTier::Failed);
    }

    #[test]
    fn test_tier_is_monotonic_in_confidence() {
        let mut previous = QualityTier::Failed;
        for step in 0..=100 {
            let tier = QualityTier::from_confidence(step as f64 / 100.0);
            assert!(tier >= previous, "tier dropped at {}", step);
            previous = tier;
        }
    }

    #[test]
    fn test_quality_metrics_weights() {
        let clean = QualityMetrics::assess(1.0, true, 0, false);
        assert_eq!(clean.data_completeness, 1.0);
        assert_eq!(clean.validation_score, 1.0);
        assert_eq!(clean.method_reliability, 0.8);
        assert!((clean.overall_score - 0.98).abs() < 1e-9);

        let fallback = QualityMetrics::assess(0.5, true, 2, true);
        assert!((fallback.validation_score - 0.6).abs() < 1e-9);
        assert!((fallback.overall_score - (0.2 + 0.3 + 0.12 + 0.04)).abs() < 1e-9);

        assert_eq!(QualityMetrics::assess(0.0, false, 9, false).validation_score, 0.0);
    }

    #[test]
    fn test_failed_result_metrics() {
        let result = ExtractionResult::failed("phone", "no match");
        assert_eq!(result.quality_metrics.data_completeness, 0.0);
        assert!((result.quality_metrics.overall_score - 0.24).abs() < 1e-9);
    }

    #[test]
    fn test_metadata_names_engine() {
        let metadata = ExtractionMetadata::now(true);
        assert!(metadata.engine.starts_with("vss-core/"));
        assert!(metadata.reference_provided);
    }

    #[test]
    fn test_reference_from_json() {
        let json = serde_json::json!({
            "Phone": "0912345678",
            "income": 25500000,
            "verified": true,
            "bank": null
        });
        let record = ReferenceRecord::from_json(&json).unwrap();
        assert_eq!(record.get("phone"), Some("0912345678"));
        assert_eq!(record.get("income"), Some("25500000"));
        assert_eq!(record.get("verified"), Some("true"));
        assert_eq!(record.get("bank"), None);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_reference_first_of_skips_blank_values() {
        let record = ReferenceRecord::new().with("sdt", " ").with("so_dien_thoai", "0912345678");
        let keys = vec!["phone".to_string(), "sdt".to_string(), "so_dien_thoai".to_string()];
        assert_eq!(record.first_of(&keys), Some(("so_dien_thoai", "0912345678")));
    }

    #[test]
    fn test_reference_rejects_non_object() {
        assert!(ReferenceRecord::from_json(&serde_json::json!([1, 2])).is_err());
    }
}
