//! Consistency check between extracted fields and a caller-supplied record.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::bank::normalize_bank;
use super::income::normalize_income;
use super::phone::normalize_phone;
use super::NormalizerKind;
use crate::models::{
    CrossCheckStatus, CrossValidationRecord, CrossValidationReport, ExtractionResult,
    LookupTables, MatchType, NormalizedValue, ReferenceRecord,
};
use crate::registry::FieldSpec;

/// Similarity given when one side contains the other. Never consistent.
const SUBSTRING_SIMILARITY: f64 = 0.7;

/// Compares extracted values with a reference record.
///
/// Cross-checking is informational: it never changes a field's confidence.
pub struct CrossValidator {
    tables: Arc<LookupTables>,
    income_tolerance: f64,
}

struct Comparison {
    similarity: f64,
    consistent: bool,
    notes: String,
}

impl CrossValidator {
    pub fn new(tables: Arc<LookupTables>, income_tolerance: f64) -> Self {
        Self {
            tables,
            income_tolerance,
        }
    }

    /// Check every field in `fields` against `reference`.
    pub fn validate<'a>(
        &self,
        fields: impl IntoIterator<Item = (&'a FieldSpec, &'a ExtractionResult)>,
        reference: &ReferenceRecord,
    ) -> CrossValidationReport {
        let mut records = BTreeMap::new();
        let mut compared = 0usize;
        let mut consistent = 0usize;
        let mut inconsistencies = Vec::new();

        for (spec, result) in fields {
            let record = self.check(spec, result, reference);
            if record.status != CrossCheckStatus::NoReference {
                compared += 1;
                if record.is_consistent {
                    consistent += 1;
                } else {
                    inconsistencies.push(format!("{}: {}", record.field, record.notes));
                }
            }
            records.insert(record.field.clone(), record);
        }

        let overall_consistency = if compared == 0 {
            1.0
        } else {
            consistent as f64 / compared as f64
        };
        debug!(
            "Cross-validation: {}/{} compared fields consistent",
            consistent, compared
        );

        CrossValidationReport {
            records,
            overall_consistency,
            inconsistencies,
        }
    }

    /// Check one field.
    pub fn check(
        &self,
        spec: &FieldSpec,
        result: &ExtractionResult,
        reference: &ReferenceRecord,
    ) -> CrossValidationRecord {
        let field = spec.name().to_string();
        let extracted = result
            .value
            .as_ref()
            .filter(|_| result.is_successful());
        let extracted_value = extracted.map(|v| v.to_string());

        let Some((key, expected)) = reference.first_of(&spec.patterns().reference_keys) else {
            return CrossValidationRecord {
                field,
                reference_key: None,
                reference_value: None,
                extracted_value,
                similarity: 0.0,
                is_consistent: true,
                status: CrossCheckStatus::NoReference,
                notes: "no reference value for this field".to_string(),
            };
        };

        let Some(value) = extracted else {
            return CrossValidationRecord {
                field,
                reference_key: Some(key.to_string()),
                reference_value: Some(expected.to_string()),
                extracted_value,
                similarity: 0.0,
                is_consistent: false,
                status: CrossCheckStatus::NotExtracted,
                notes: "reference has a value but the field was not extracted".to_string(),
            };
        };

        let comparison = match spec.patterns().normalizer {
            NormalizerKind::Phone => compare_phone(value, expected),
            NormalizerKind::Income => self.compare_income(value, expected),
            NormalizerKind::Bank => self.compare_bank(value, expected),
            _ => compare_text(value, expected),
        };

        CrossValidationRecord {
            field,
            reference_key: Some(key.to_string()),
            reference_value: Some(expected.to_string()),
            extracted_value,
            similarity: comparison.similarity,
            is_consistent: comparison.consistent,
            status: if comparison.consistent {
                CrossCheckStatus::Match
            } else {
                CrossCheckStatus::Mismatch
            },
            notes: comparison.notes,
        }
    }

    fn compare_income(&self, value: &NormalizedValue, expected: &str) -> Comparison {
        let NormalizedValue::Income(income) = value else {
            return compare_text(value, expected);
        };
        let reference = match normalize_income(expected, None, &self.tables.unit_multipliers).value
        {
            NormalizedValue::Income(reference) => reference,
            _ => {
                return Comparison {
                    similarity: 0.0,
                    consistent: false,
                    notes: format!("reference income is not a number: {}", expected),
                };
            }
        };

        let diff = income.amount.abs_diff(reference.amount) as f64;
        let (similarity, consistent) = if reference.amount == 0 {
            let same = income.amount == 0;
            (if same { 1.0 } else { 0.0 }, same)
        } else {
            let ratio = diff / reference.amount as f64;
            ((1.0 - ratio).max(0.0), ratio < self.income_tolerance)
        };

        Comparison {
            similarity,
            consistent,
            notes: format!(
                "extracted {} vs reference {} ({:.1}% difference)",
                income.formatted,
                reference.formatted,
                if reference.amount == 0 {
                    0.0
                } else {
                    diff * 100.0 / reference.amount as f64
                }
            ),
        }
    }

    /// A reference naming the same bank code exactly is a match; anything
    /// else falls back to text comparison.
    fn compare_bank(&self, value: &NormalizedValue, expected: &str) -> Comparison {
        let NormalizedValue::Bank(bank) = value else {
            return compare_text(value, expected);
        };
        let reference = match normalize_bank(expected, &self.tables.banks).value {
            NormalizedValue::Bank(reference) => reference,
            _ => return compare_text(value, expected),
        };

        match (&bank.code, &reference.code) {
            (Some(code), Some(other))
                if code == other && reference.match_type == MatchType::Exact =>
            {
                Comparison {
                    similarity: 1.0,
                    consistent: true,
                    notes: format!("same bank code {}", code),
                }
            }
            _ => compare_text(value, expected),
        }
    }
}

fn compare_phone(value: &NormalizedValue, expected: &str) -> Comparison {
    let expected = normalize_phone(expected).value;
    if *value == expected {
        Comparison {
            similarity: 1.0,
            consistent: true,
            notes: "phone numbers match".to_string(),
        }
    } else {
        Comparison {
            similarity: 0.0,
            consistent: false,
            notes: format!("phone {} differs from reference {}", value, expected),
        }
    }
}

/// Case-insensitive comparison against every display form of the value.
///
/// Only an exact match is consistent; containment in either direction
/// scores [`SUBSTRING_SIMILARITY`] but is still a mismatch.
fn compare_text(value: &NormalizedValue, expected: &str) -> Comparison {
    let expected = expected.trim().to_lowercase();
    let forms: Vec<String> = match value {
        NormalizedValue::Bank(bank) => {
            let mut forms = vec![bank.full_name.clone(), bank.original.trim().to_string()];
            forms.extend(bank.code.clone());
            forms
        }
        other => vec![other.to_string()],
    };
    let forms: Vec<String> = forms.iter().map(|f| f.to_lowercase()).collect();

    if forms.iter().any(|f| *f == expected) {
        Comparison {
            similarity: 1.0,
            consistent: true,
            notes: "exact match".to_string(),
        }
    } else if forms
        .iter()
        .any(|f| !f.is_empty() && (f.contains(&expected) || expected.contains(f.as_str())))
    {
        Comparison {
            similarity: SUBSTRING_SIMILARITY,
            consistent: false,
            notes: format!("'{}' only partially matches reference '{}'", value, expected),
        }
    } else {
        Comparison {
            similarity: 0.0,
            consistent: false,
            notes: format!("'{}' differs from reference '{}'", value, expected),
        }
    }
}
