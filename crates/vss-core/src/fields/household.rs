//! Household code normalization.

use super::patterns::HOUSEHOLD_SHAPE;
use super::Normalized;
use crate::models::NormalizedValue;

/// Uppercase and strip whitespace; malformed codes are returned unchanged.
pub fn normalize_household_code(raw: &str) -> Normalized {
    let mut steps = Normalized::trace(raw);

    let upper = raw.to_uppercase();
    if upper != raw {
        steps.push("uppercase_conversion".to_string());
    }
    let compact: String = upper.chars().filter(|c| !c.is_whitespace()).collect();
    if compact != upper {
        steps.push("spaces_removed".to_string());
    }

    if is_valid_household_code(&compact) {
        Normalized {
            value: NormalizedValue::HouseholdCode(compact),
            steps,
        }
    } else {
        steps.push("passthrough".to_string());
        Normalized {
            value: NormalizedValue::HouseholdCode(raw.to_string()),
            steps,
        }
    }
}

/// 8 to 15 uppercase letters or digits.
pub fn is_valid_household_code(code: &str) -> bool {
    HOUSEHOLD_SHAPE.is_match(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_household_code() {
        let normalized = normalize_household_code(" hgd123456789 ");
        assert_eq!(
            normalized.value,
            NormalizedValue::HouseholdCode("HGD123456789".to_string())
        );
        assert_eq!(
            normalized.steps,
            vec!["raw_candidate= hgd123456789 ", "uppercase_conversion", "spaces_removed"]
        );
    }

    #[test]
    fn test_inner_spaces_removed() {
        let normalized = normalize_household_code("HGD 2023 01234");
        assert_eq!(
            normalized.value,
            NormalizedValue::HouseholdCode("HGD202301234".to_string())
        );
    }

    #[test]
    fn test_malformed_code_is_unchanged() {
        let normalized = normalize_household_code("hgd-12");
        assert_eq!(normalized.value, NormalizedValue::HouseholdCode("hgd-12".to_string()));
        assert_eq!(normalized.steps.last().unwrap(), "passthrough");
    }

    #[test]
    fn test_is_valid_household_code() {
        assert!(is_valid_household_code("HGD202301234"));
        assert!(is_valid_household_code("12345678"));
        assert!(!is_valid_household_code("HGD12"));
        assert!(!is_valid_household_code("HGD-20230123"));
        assert!(!is_valid_household_code("hgd202301234"));
    }
}
