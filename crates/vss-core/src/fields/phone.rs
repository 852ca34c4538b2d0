//! Vietnamese mobile number normalization and validation.

use super::patterns::PHONE_SHAPE;
use super::Normalized;
use crate::models::NormalizedValue;

/// Normalize a phone candidate to the domestic `0xxxxxxxxx` form.
///
/// Non-digits are dropped and a leading `84` country code becomes `0`. When
/// the result is not a Vietnamese mobile number the raw text is returned
/// unchanged.
pub fn normalize_phone(raw: &str) -> Normalized {
    let mut steps = Normalized::trace(raw);

    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits != raw.trim() {
        steps.push("formatting_removed".to_string());
    }

    if digits.starts_with("84") && digits.len() >= 11 {
        digits = format!("0{}", &digits[2..]);
        steps.push("international_prefix_converted".to_string());
    }

    if is_valid_phone(&digits) {
        if digits != raw {
            steps.push("value_changed".to_string());
        }
        Normalized {
            value: NormalizedValue::PhoneNumber(digits),
            steps,
        }
    } else {
        steps.push("passthrough".to_string());
        Normalized {
            value: NormalizedValue::PhoneNumber(raw.to_string()),
            steps,
        }
    }
}

/// Check a normalized number against the Vietnamese mobile pattern.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_SHAPE.is_match(phone)
}
