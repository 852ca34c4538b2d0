//! Bank name resolution against the bank table.

use std::collections::HashSet;

use super::Normalized;
use crate::models::{BankEntry, BankMatch, MatchType, NormalizedValue};

/// Words too common in Vietnamese bank names to identify one.
const STOPWORDS: &[&str] = &[
    "NGÂN", "HÀNG", "NH", "TMCP", "BANK", "VIỆT", "NAM", "VÀ", "CỔ", "PHẦN", "THƯƠNG", "MẠI",
];

/// Resolve a bank candidate.
///
/// A token equal to a bank code or a brand alias inside the text is an exact
/// match. Otherwise the bank whose official name shares the most significant
/// words is a partial match. Anything else is kept, title-cased, as unknown.
pub fn normalize_bank(raw: &str, banks: &[BankEntry]) -> Normalized {
    let mut steps = Normalized::trace(raw);
    let upper = raw.trim().to_uppercase();
    let tokens = words(&upper);

    let exact = banks.iter().find(|bank| {
        tokens.iter().any(|t| *t == bank.code) || bank.aliases.iter().any(|a| upper.contains(a.as_str()))
    });

    let (bank, match_type, confidence) = match exact {
        Some(bank) => (Some(bank), MatchType::Exact, 1.0),
        None => match best_partial(&tokens, banks) {
            Some(bank) => (Some(bank), MatchType::Partial, 0.8),
            None => (None, MatchType::Unknown, 0.5),
        },
    };

    let value = match bank {
        Some(bank) => {
            steps.push("bank_name_standardized".to_string());
            BankMatch {
                code: Some(bank.code.clone()),
                full_name: bank.full_name.clone(),
                match_type,
                confidence,
                original: raw.to_string(),
            }
        }
        None => {
            steps.push("title_cased".to_string());
            BankMatch {
                code: None,
                full_name: title_case(raw.trim()),
                match_type,
                confidence,
                original: raw.to_string(),
            }
        }
    };

    Normalized {
        value: NormalizedValue::Bank(value),
        steps,
    }
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

fn significant(words: &[&str]) -> HashSet<String> {
    words
        .iter()
        .filter(|w| !STOPWORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}

fn best_partial<'a>(tokens: &[&str], banks: &'a [BankEntry]) -> Option<&'a BankEntry> {
    let wanted = significant(tokens);
    if wanted.is_empty() {
        return None;
    }
    // A single-word input may match on that word; longer inputs need two.
    let required = if wanted.len() == 1 { 1 } else { 2 };

    let mut best: Option<(&BankEntry, usize)> = None;
    for bank in banks {
        let name = bank.full_name.to_uppercase();
        let overlap = significant(&words(&name)).intersection(&wanted).count();
        if overlap >= required && best.is_none_or(|(_, score)| overlap > score) {
            best = Some((bank, overlap));
        }
    }
    best.map(|(bank, _)| bank)
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
