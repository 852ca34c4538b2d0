//! Income amount parsing with Vietnamese unit words.

use super::patterns::NUMBER_RUN;
use super::Normalized;
use crate::models::{Income, NormalizedValue, UnitMultiplier};

/// Largest number of fraction digits kept when a multiplier applies.
const MAX_FRACTION_DIGITS: usize = 9;

/// Shortest unit keyword looked up in document text. Abbreviations such as
/// "tr" and "k" only count inside the candidate.
const MIN_DOCUMENT_UNIT_CHARS: usize = 3;

/// Normalize an income candidate to whole VND.
///
/// The first number in the candidate is parsed; a separator followed by
/// exactly three digits is a thousands separator, any other trailing group is
/// a fraction. Unit keywords are searched in the candidate and, when
/// `document` is given and the candidate has none, full-word units are
/// searched in the document text.
pub fn normalize_income(
    raw: &str,
    document: Option<&str>,
    multipliers: &[UnitMultiplier],
) -> Normalized {
    let mut steps = Normalized::trace(raw);

    let Some(number) = NUMBER_RUN.find(raw) else {
        steps.push("normalization_failed: no digits".to_string());
        return passthrough(raw, steps);
    };
    if number.as_str() != raw.trim() {
        steps.push("formatting_removed".to_string());
    }

    let Some((integer, fraction)) = split_number(number.as_str()) else {
        steps.push("normalization_failed: amount too large".to_string());
        return passthrough(raw, steps);
    };
    steps.push("currency_parsed".to_string());

    let unit = match find_unit(raw, multipliers.iter()) {
        Some(unit) => Some(unit),
        None => document.and_then(|text| {
            let word_units = multipliers
                .iter()
                .filter(|unit| unit.keyword.chars().count() >= MIN_DOCUMENT_UNIT_CHARS);
            let unit = find_unit(text, word_units);
            if unit.is_some() {
                steps.push("multiplier_source:document".to_string());
            }
            unit
        }),
    };

    let amount = match unit {
        Some(unit) => {
            steps.push(format!("multiplier_applied:{}", unit.keyword));
            scale(integer, &fraction, unit.factor)
        }
        None => {
            if !fraction.is_empty() {
                steps.push("fraction_dropped".to_string());
            }
            Some(integer)
        }
    };

    let Some(amount) = amount else {
        steps.push("normalization_failed: amount too large".to_string());
        return passthrough(raw, steps);
    };

    Normalized {
        value: NormalizedValue::Income(Income {
            amount,
            currency: "VND".to_string(),
            multiplier_applied: unit.map(|u| u.keyword.clone()),
            formatted: format_vnd(amount),
        }),
        steps,
    }
}

fn passthrough(raw: &str, steps: Vec<String>) -> Normalized {
    Normalized {
        value: NormalizedValue::Raw(raw.to_string()),
        steps,
    }
}

/// Split "25,500,000" / "1.234,56" / "25.0" into integer and fraction digits.
fn split_number(number: &str) -> Option<(u64, String)> {
    let number = number.trim_end_matches(['.', ',']);
    let groups: Vec<&str> = number.split(['.', ',']).collect();

    let (integer_groups, fraction) = match groups.split_last() {
        Some((last, rest)) if !rest.is_empty() && last.len() != 3 => (rest, last.to_string()),
        _ => (groups.as_slice(), String::new()),
    };

    let integer: String = integer_groups.concat();
    integer.parse::<u64>().ok().map(|value| (value, fraction))
}

fn scale(integer: u64, fraction: &str, factor: u64) -> Option<u64> {
    let mut amount = integer.checked_mul(factor)?;
    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if !fraction.is_empty() {
        let digits: u64 = fraction.parse().ok()?;
        let divisor = 10u64.pow(fraction.len() as u32);
        amount = amount.checked_add(digits.checked_mul(factor)? / divisor)?;
    }
    Some(amount)
}

/// First unit keyword (in table order) present in `text` as a whole token
/// or glued to a number ("500k").
fn find_unit<'a>(
    text: &str,
    mut multipliers: impl Iterator<Item = &'a UnitMultiplier>,
) -> Option<&'a UnitMultiplier> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '.' || c == ','))
        .map(|t| t.trim_matches(['.', ',']))
        .filter(|t| !t.is_empty())
        .collect();

    multipliers.find(|unit| {
        tokens.iter().any(|token| {
            *token == unit.keyword
                || token.strip_suffix(unit.keyword.as_str()).is_some_and(|number| {
                    !number.is_empty()
                        && number.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
                })
        })
    })
}

/// Format an amount with comma thousands separators ("25,500,000 VND").
pub fn format_vnd(amount: u64) -> String {
    let digits = amount.to_string();
    let chars: Vec<char> = digits.chars().collect();
    let mut formatted = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }
    format!("{} VND", formatted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LookupTables;
    use pretty_assertions::assert_eq;

    fn income(raw: &str, document: Option<&str>) -> Income {
        let tables = LookupTables::default();
        match normalize_income(raw, document, &tables.unit_multipliers).value {
            NormalizedValue::Income(income) => income,
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_million_keyword() {
        let parsed = income("18 triệu đồng", None);
        assert_eq!(parsed.amount, 18_000_000);
        assert_eq!(parsed.multiplier_applied.as_deref(), Some("triệu"));
        assert_eq!(parsed.currency, "VND");
    }

    #[test]
    fn test_grouped_amount() {
        let parsed = income("25,500,000 VND", None);
        assert_eq!(parsed.amount, 25_500_000);
        assert_eq!(parsed.multiplier_applied, None);
        assert_eq!(parsed.formatted, "25,500,000 VND");

        assert_eq!(income("22.800.000 đồng", None).amount, 22_800_000);
    }

    #[test]
    fn test_decimal_with_multiplier() {
        assert_eq!(income("25.0 triệu", None).amount, 25_000_000);
        assert_eq!(income("2,5 tỷ", None).amount, 2_500_000_000);
        assert_eq!(income("18,5tr", None).amount, 18_500_000);
    }

    #[test]
    fn test_glued_thousand_suffix() {
        assert_eq!(income("500k", None).amount, 500_000);
        // "k" inside a word is not a unit
        assert_eq!(income("500 kg", None).amount, 500);
    }

    #[test]
    fn test_document_scope_only_when_candidate_has_no_unit() {
        assert_eq!(income("18", Some("đơn vị: triệu")).amount, 18_000_000);
        assert_eq!(income("18 nghìn", Some("đơn vị: triệu")).amount, 18_000);
        assert_eq!(income("18", None).amount, 18);
    }

    #[test]
    fn test_document_scope_ignores_abbreviated_units() {
        let page = "Thu nhập 25,500,000 VND Tr 2/3 Tải về 500k";
        let parsed = income("25,500,000", Some(page));
        assert_eq!(parsed.amount, 25_500_000);
        assert_eq!(parsed.multiplier_applied, None);

        // Abbreviations still apply inside the candidate
        assert_eq!(income("18tr", Some(page)).amount, 18_000_000);
    }

    #[test]
    fn test_no_digits_passes_through() {
        let tables = LookupTables::default();
        let normalized = normalize_income("không rõ", None, &tables.unit_multipliers);
        assert_eq!(normalized.value, NormalizedValue::Raw("không rõ".to_string()));
        assert_eq!(normalized.steps[0], "raw_candidate=không rõ");
    }

    #[test]
    fn test_overflow_passes_through() {
        let tables = LookupTables::default();
        let normalized =
            normalize_income("99999999999999999999 tỷ", None, &tables.unit_multipliers);
        assert!(matches!(normalized.value, NormalizedValue::Raw(_)));
    }

    #[test]
    fn test_format_vnd() {
        assert_eq!(format_vnd(0), "0 VND");
        assert_eq!(format_vnd(999), "999 VND");
        assert_eq!(format_vnd(1_000), "1,000 VND");
        assert_eq!(format_vnd(25_500_000), "25,500,000 VND");
    }
}
