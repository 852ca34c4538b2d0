//! Candidate and normalized value types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five matching strategies, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// CSS selector with optional `:contains` anchor.
    Selector,
    /// Case-insensitive regex over the raw document.
    Regex,
    /// Value next to a label keyword.
    Context,
    /// Constrained XPath-like sibling traversal.
    Path,
    /// Loose patterns, only when everything else failed.
    Fallback,
}

impl StrategyKind {
    /// Base confidence weight of a candidate produced by this strategy.
    pub fn base_weight(&self) -> f64 {
        match self {
            StrategyKind::Selector => 1.0,
            StrategyKind::Regex => 0.9,
            StrategyKind::Context => 0.8,
            StrategyKind::Path => 0.9,
            StrategyKind::Fallback => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Selector => "selector",
            StrategyKind::Regex => "regex",
            StrategyKind::Context => "context",
            StrategyKind::Path => "path",
            StrategyKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw value proposed by one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Field the candidate was produced for.
    pub field: String,
    /// Raw text as found in the document.
    pub raw: String,
    /// Strategy that produced it.
    pub strategy: StrategyKind,
    /// Base weight (from the strategy).
    pub weight: f64,
}

impl Candidate {
    pub fn new(field: impl Into<String>, raw: impl Into<String>, strategy: StrategyKind) -> Self {
        Self {
            field: field.into(),
            raw: raw.into(),
            strategy,
            weight: strategy.base_weight(),
        }
    }
}

/// Parsed income amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Income {
    /// Amount in whole VND.
    pub amount: u64,
    /// Always "VND".
    pub currency: String,
    /// Unit keyword that scaled the amount, if any.
    pub multiplier_applied: Option<String>,
    /// Display form, e.g. "25,500,000 VND".
    pub formatted: String,
}

/// How a bank string was resolved against the bank table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Partial,
    Unknown,
}

/// Resolved bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankMatch {
    /// Bank code, when the bank was recognized.
    pub code: Option<String>,
    /// Official name, or the title-cased input for unknown banks.
    pub full_name: String,
    pub match_type: MatchType,
    /// 1.0 exact, 0.8 partial, 0.5 unknown.
    pub confidence: f64,
    /// Input text before resolution.
    pub original: String,
}

/// One household member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub relationship: String,
    pub birth_year: Option<u16>,
}

impl Member {
    pub fn new(name: impl Into<String>, relationship: impl Into<String>, birth_year: Option<u16>) -> Self {
        Self {
            name: name.into(),
            relationship: relationship.into(),
            birth_year,
        }
    }

    /// Case-insensitive identity used for deduplication.
    pub fn key(&self) -> (String, String) {
        (
            self.name.trim().to_lowercase(),
            self.relationship.trim().to_lowercase(),
        )
    }
}

/// Field value after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NormalizedValue {
    /// Ten or eleven digit mobile number starting with 0, or the raw text when
    /// it does not look like one.
    PhoneNumber(String),
    Income(Income),
    Bank(BankMatch),
    /// Uppercase alphanumeric code, or the raw text when malformed.
    HouseholdCode(String),
    MemberList(Vec<Member>),
    /// Unchanged input when no typed value could be produced.
    Raw(String),
}

impl NormalizedValue {
    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            NormalizedValue::PhoneNumber(_) => "phone_number",
            NormalizedValue::Income(_) => "income",
            NormalizedValue::Bank(_) => "bank",
            NormalizedValue::HouseholdCode(_) => "household_code",
            NormalizedValue::MemberList(_) => "member_list",
            NormalizedValue::Raw(_) => "raw",
        }
    }

    /// Whether the value carries no data (empty text or no members).
    pub fn is_empty(&self) -> bool {
        match self {
            NormalizedValue::PhoneNumber(s)
            | NormalizedValue::HouseholdCode(s)
            | NormalizedValue::Raw(s) => s.trim().is_empty(),
            NormalizedValue::MemberList(members) => members.is_empty(),
            NormalizedValue::Income(_) | NormalizedValue::Bank(_) => false,
        }
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::PhoneNumber(s)
            | NormalizedValue::HouseholdCode(s)
            | NormalizedValue::Raw(s) => f.write_str(s),
            NormalizedValue::Income(income) => f.write_str(&income.formatted),
            NormalizedValue::Bank(bank) => match &bank.code {
                Some(code) => write!(f, "{} ({})", bank.full_name, code),
                None => f.write_str(&bank.full_name),
            },
            NormalizedValue::MemberList(members) => {
                let parts: Vec<String> = members
                    .iter()
                    .map(|m| match m.birth_year {
                        Some(year) => format!("{} - {} - {}", m.name, m.relationship, year),
                        None => format!("{} - {}", m.name, m.relationship),
                    })
                    .collect();
                f.write_str(&parts.join("; "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strategy_weights() {
        assert_eq!(StrategyKind::Selector.base_weight(), 1.0);
        assert_eq!(StrategyKind::Regex.base_weight(), StrategyKind::Path.base_weight());
        assert!(StrategyKind::Context.base_weight() > StrategyKind::Fallback.base_weight());
    }

    #[test]
    fn test_normalized_value_serialization() {
        let value = NormalizedValue::PhoneNumber("0912345678".to_string());
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"type":"phone_number","value":"0912345678"}"#);
    }

    #[test]
    fn test_member_list_display() {
        let value = NormalizedValue::MemberList(vec![
            Member::new("Trần Thị Bình", "Vợ", Some(1987)),
            Member::new("Nguyễn Văn Cường", "Con", None),
        ]);
        assert_eq!(value.to_string(), "Trần Thị Bình - Vợ - 1987; Nguyễn Văn Cường - Con");
        assert!(!value.is_empty());
        assert!(NormalizedValue::MemberList(vec![]).is_empty());
    }
}
