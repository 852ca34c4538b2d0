//! Field-specific normalization and validation.
//!
//! Every normalizer is a pure function of the raw candidate (plus the lookup
//! tables) and records the transformations it applied. Validators inspect the
//! normalized value and report errors and warnings without failing.

pub mod bank;
pub mod cross;
pub mod household;
pub mod income;
pub mod members;
pub mod patterns;
pub mod phone;
pub mod validate;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{LookupTables, NormalizedValue, UnitScope};

pub use bank::normalize_bank;
pub use cross::CrossValidator;
pub use household::{is_valid_household_code, normalize_household_code};
pub use income::{format_vnd, normalize_income};
pub use members::{dedup_members, MemberCascade, MemberStage};
pub use phone::{is_valid_phone, normalize_phone};
pub use validate::{ValidationReport, ValidationRule, Validators};

/// Normalization pipeline attached to a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerKind {
    Phone,
    Income,
    Bank,
    HouseholdCode,
    Members,
    /// Trimmed raw text.
    #[default]
    Passthrough,
}

/// A normalized value with the trace of applied steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub value: NormalizedValue,
    /// First entry is always `raw_candidate=<raw>`.
    pub steps: Vec<String>,
}

impl Normalized {
    /// Step list seeded with the raw candidate.
    pub fn trace(raw: &str) -> Vec<String> {
        vec![format!("raw_candidate={}", raw)]
    }
}

/// Dispatches raw candidates to the field normalizers.
pub struct Normalizers {
    tables: Arc<LookupTables>,
    unit_scope: UnitScope,
    members: MemberCascade,
}

impl Normalizers {
    pub fn new(tables: Arc<LookupTables>, unit_scope: UnitScope) -> Result<Self> {
        let members = MemberCascade::standard(tables.clone())?;
        Ok(Self {
            tables,
            unit_scope,
            members,
        })
    }

    pub fn tables(&self) -> &LookupTables {
        &self.tables
    }

    /// Normalize `raw` with the given pipeline.
    ///
    /// `document_text` is only consulted by the income normalizer when the
    /// unit scope is the whole document.
    pub fn normalize(&self, kind: NormalizerKind, raw: &str, document_text: &str) -> Normalized {
        match kind {
            NormalizerKind::Phone => normalize_phone(raw),
            NormalizerKind::Income => {
                let document = match self.unit_scope {
                    UnitScope::Document => Some(document_text),
                    UnitScope::Candidate => None,
                };
                normalize_income(raw, document, &self.tables.unit_multipliers)
            }
            NormalizerKind::Bank => normalize_bank(raw, &self.tables.banks),
            NormalizerKind::HouseholdCode => normalize_household_code(raw),
            NormalizerKind::Members => self.members.normalize(raw),
            NormalizerKind::Passthrough => {
                let mut steps = Normalized::trace(raw);
                let trimmed = raw.trim();
                if trimmed != raw {
                    steps.push("whitespace_trimmed".to_string());
                }
                Normalized {
                    value: NormalizedValue::Raw(trimmed.to_string()),
                    steps,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalizers(scope: UnitScope) -> Normalizers {
        Normalizers::new(Arc::new(LookupTables::default()), scope).unwrap()
    }

    #[test]
    fn test_passthrough_trims() {
        let n = normalizers(UnitScope::Document).normalize(NormalizerKind::Passthrough, " x ", "");
        assert_eq!(n.value, NormalizedValue::Raw("x".to_string()));
        assert_eq!(n.steps, vec!["raw_candidate= x ", "whitespace_trimmed"]);
    }

    #[test]
    fn test_unit_scope_controls_document_lookup() {
        let document = "Thu nhập: 18 (đơn vị: triệu đồng)";

        let n = normalizers(UnitScope::Document).normalize(NormalizerKind::Income, "18", document);
        match n.value {
            NormalizedValue::Income(income) => assert_eq!(income.amount, 18_000_000),
            other => panic!("unexpected value: {:?}", other),
        }

        let n = normalizers(UnitScope::Candidate).normalize(NormalizerKind::Income, "18", document);
        match n.value {
            NormalizedValue::Income(income) => assert_eq!(income.amount, 18),
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_every_kind_records_raw_candidate_first() {
        let n = normalizers(UnitScope::Document);
        for kind in [
            NormalizerKind::Phone,
            NormalizerKind::Income,
            NormalizerKind::Bank,
            NormalizerKind::HouseholdCode,
            NormalizerKind::Members,
            NormalizerKind::Passthrough,
        ] {
            let result = n.normalize(kind, "???", "");
            assert_eq!(result.steps[0], "raw_candidate=???", "{:?}", kind);
        }
    }
}
