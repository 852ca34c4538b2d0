//! Rule-driven validation of normalized values.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::household::is_valid_household_code;
use super::income::format_vnd;
use super::phone::is_valid_phone;
use crate::models::{LookupTables, MatchType, NormalizedValue, ValidationConfig};

/// A named check attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    /// Error unless the value is a Vietnamese mobile number.
    PhoneFormat,
    /// Warning when the three-digit prefix belongs to no known carrier.
    PhonePrefix,
    /// Error when the income could not be parsed into an amount.
    IncomeParsed,
    /// Error when the amount is outside the configured range.
    IncomeRange,
    /// Warning when the bank was not found in the bank table.
    KnownBank,
    /// Error unless the code is 8-15 uppercase letters or digits.
    HouseholdFormat,
    /// Error when no member was recognized.
    MembersPresent,
    /// Error per member missing a name or relationship.
    MemberCompleteness,
    /// Warning per member with an implausible birth year or unknown relationship.
    BirthYearRange,
    /// Error when the value is blank.
    NonEmpty,
}

impl ValidationRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationRule::PhoneFormat => "phone_format",
            ValidationRule::PhonePrefix => "phone_prefix",
            ValidationRule::IncomeParsed => "income_parsed",
            ValidationRule::IncomeRange => "income_range",
            ValidationRule::KnownBank => "known_bank",
            ValidationRule::HouseholdFormat => "household_format",
            ValidationRule::MembersPresent => "members_present",
            ValidationRule::MemberCompleteness => "member_completeness",
            ValidationRule::BirthYearRange => "birth_year_range",
            ValidationRule::NonEmpty => "non_empty",
        }
    }
}

/// Errors and warnings produced for one value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Applies validation rules using the lookup tables and thresholds.
pub struct Validators {
    tables: Arc<LookupTables>,
    config: ValidationConfig,
}

impl Validators {
    pub fn new(tables: Arc<LookupTables>, config: ValidationConfig) -> Self {
        Self { tables, config }
    }

    /// Run every rule against the value. Rules that do not apply to the
    /// value's type are skipped.
    pub fn validate(&self, rules: &[ValidationRule], value: &NormalizedValue) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in rules {
            self.apply(*rule, value, &mut report);
        }
        report
    }

    fn apply(&self, rule: ValidationRule, value: &NormalizedValue, report: &mut ValidationReport) {
        match (rule, value) {
            (ValidationRule::PhoneFormat, NormalizedValue::PhoneNumber(phone)) => {
                if !is_valid_phone(phone) {
                    report.error(format!("invalid Vietnamese phone number format: {}", phone));
                }
            }
            (ValidationRule::PhonePrefix, NormalizedValue::PhoneNumber(phone)) => {
                if is_valid_phone(phone) && self.tables.carrier(phone).is_none() {
                    report.warning(format!("unknown phone prefix: {}", &phone[..3]));
                }
            }
            (ValidationRule::IncomeParsed, NormalizedValue::Raw(raw)) => {
                report.error(format!("income could not be parsed: {}", raw));
            }
            (ValidationRule::IncomeRange, NormalizedValue::Income(income)) => {
                if income.amount < self.config.income_min {
                    report.error(format!(
                        "income {} is below the expected minimum {}",
                        income.formatted,
                        format_vnd(self.config.income_min)
                    ));
                } else if income.amount > self.config.income_max {
                    report.error(format!(
                        "income {} is above the expected maximum {}",
                        income.formatted,
                        format_vnd(self.config.income_max)
                    ));
                }
            }
            (ValidationRule::KnownBank, NormalizedValue::Bank(bank)) => {
                if bank.match_type == MatchType::Unknown {
                    report.warning(format!("bank not found in known banks list: {}", bank.full_name));
                }
            }
            (ValidationRule::HouseholdFormat, NormalizedValue::HouseholdCode(code)) => {
                if !is_valid_household_code(code) {
                    report.error(format!("invalid household code format: {}", code));
                }
            }
            (ValidationRule::MembersPresent, NormalizedValue::MemberList(members)) => {
                if members.is_empty() {
                    report.error("no member information found");
                }
            }
            (ValidationRule::MemberCompleteness, NormalizedValue::MemberList(members)) => {
                for (i, member) in members.iter().enumerate() {
                    if member.name.trim().is_empty() {
                        report.error(format!("member {}: missing name", i + 1));
                    }
                    if member.relationship.trim().is_empty() {
                        report.error(format!("member {}: missing relationship", i + 1));
                    }
                }
            }
            (ValidationRule::BirthYearRange, NormalizedValue::MemberList(members)) => {
                let current_year = Utc::now().year();
                for (i, member) in members.iter().enumerate() {
                    if let Some(year) = member.birth_year {
                        if year < self.config.birth_year_min || i32::from(year) > current_year {
                            report.warning(format!(
                                "member {}: unreasonable birth year {}",
                                i + 1,
                                year
                            ));
                        }
                    }
                    if !member.relationship.trim().is_empty()
                        && !self.tables.is_canonical_relationship(&member.relationship)
                    {
                        report.warning(format!(
                            "member {}: unknown relationship {}",
                            i + 1,
                            member.relationship
                        ));
                    }
                }
            }
            (ValidationRule::NonEmpty, value) => {
                if value.is_empty() {
                    report.error("value is empty");
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BankMatch, Income, Member};
    use pretty_assertions::assert_eq;

    fn validators() -> Validators {
        Validators::new(Arc::new(LookupTables::default()), ValidationConfig::default())
    }

    fn income(amount: u64) -> NormalizedValue {
        NormalizedValue::Income(Income {
            amount,
            currency: "VND".to_string(),
            multiplier_applied: None,
            formatted: format_vnd(amount),
        })
    }

    #[test]
    fn test_phone_rules() {
        let rules = [ValidationRule::PhoneFormat, ValidationRule::PhonePrefix];
        let v = validators();

        let ok = v.validate(&rules, &NormalizedValue::PhoneNumber("0912345678".to_string()));
        assert_eq!(ok, ValidationReport::default());

        let unknown_prefix =
            v.validate(&rules, &NormalizedValue::PhoneNumber("0123456789".to_string()));
        assert!(unknown_prefix.is_valid());
        assert_eq!(unknown_prefix.warnings, vec!["unknown phone prefix: 012"]);

        let malformed = v.validate(&rules, &NormalizedValue::PhoneNumber("abc".to_string()));
        assert_eq!(malformed.errors.len(), 1);
        assert!(malformed.warnings.is_empty());
    }

    #[test]
    fn test_income_range() {
        let rules = [ValidationRule::IncomeParsed, ValidationRule::IncomeRange];
        let v = validators();

        assert!(v.validate(&rules, &income(25_500_000)).is_valid());
        assert!(v.validate(&rules, &income(100_000)).is_valid());
        assert!(v.validate(&rules, &income(100_000_000)).is_valid());

        let low = v.validate(&rules, &income(50_000));
        assert_eq!(
            low.errors,
            vec!["income 50,000 VND is below the expected minimum 100,000 VND"]
        );
        assert!(!v.validate(&rules, &income(100_000_001)).is_valid());

        let raw = v.validate(&rules, &NormalizedValue::Raw("n/a".to_string()));
        assert_eq!(raw.errors, vec!["income could not be parsed: n/a"]);
    }

    #[test]
    fn test_unknown_bank_is_warning() {
        let value = NormalizedValue::Bank(BankMatch {
            code: None,
            full_name: "Xyz".to_string(),
            match_type: MatchType::Unknown,
            confidence: 0.5,
            original: "xyz".to_string(),
        });
        let report = validators().validate(&[ValidationRule::KnownBank], &value);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_household_format() {
        let v = validators();
        let rules = [ValidationRule::HouseholdFormat];
        assert!(v
            .validate(&rules, &NormalizedValue::HouseholdCode("HGD202301234".to_string()))
            .is_valid());
        assert!(!v
            .validate(&rules, &NormalizedValue::HouseholdCode("hgd-12".to_string()))
            .is_valid());
    }

    #[test]
    fn test_member_rules() {
        let rules = [
            ValidationRule::MembersPresent,
            ValidationRule::MemberCompleteness,
            ValidationRule::BirthYearRange,
        ];
        let v = validators();

        let empty = v.validate(&rules, &NormalizedValue::MemberList(vec![]));
        assert_eq!(empty.errors, vec!["no member information found"]);

        let members = NormalizedValue::MemberList(vec![
            Member::new("Trần Thị Bình", "Vợ", Some(1987)),
            Member::new("", "Con", Some(1850)),
            Member::new("Lê Văn Minh", "Hàng xóm", None),
        ]);
        let report = v.validate(&rules, &members);
        assert_eq!(report.errors, vec!["member 2: missing name"]);
        assert_eq!(
            report.warnings,
            vec![
                "member 2: unreasonable birth year 1850",
                "member 3: unknown relationship Hàng xóm",
            ]
        );
    }

    #[test]
    fn test_rules_skip_other_value_types() {
        let report = validators().validate(
            &[ValidationRule::PhoneFormat, ValidationRule::HouseholdFormat],
            &NormalizedValue::MemberList(vec![]),
        );
        assert_eq!(report, ValidationReport::default());
    }

    #[test]
    fn test_non_empty() {
        let v = validators();
        assert!(!v.validate(&[ValidationRule::NonEmpty], &NormalizedValue::Raw(" ".to_string())).is_valid());
        assert!(v.validate(&[ValidationRule::NonEmpty], &NormalizedValue::Raw("x".to_string())).is_valid());
    }
}
