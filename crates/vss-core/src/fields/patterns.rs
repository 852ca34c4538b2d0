//! Common regex patterns for field normalization and validation.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Vietnamese mobile number after normalization
    pub static ref PHONE_SHAPE: Regex = Regex::new(r"^0[1-9]\d{8,9}$").unwrap();

    // Household code after normalization
    pub static ref HOUSEHOLD_SHAPE: Regex = Regex::new(r"^[A-Z0-9]{8,15}$").unwrap();

    // First number with optional grouping/decimal separators
    pub static ref NUMBER_RUN: Regex = Regex::new(r"\d[\d.,]*").unwrap();

    // Plausible birth year inside free text
    pub static ref BIRTH_YEAR: Regex = Regex::new(r"\b((?:19|20)\d{2})\b").unwrap();

    // A cell holding only a year
    pub static ref YEAR_CELL: Regex = Regex::new(r"^\d{4}$").unwrap();

    // Table markup captured by regex strategies
    pub static ref HTML_ROW: Regex = Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap();
    pub static ref HTML_CELL: Regex = Regex::new(r"(?is)<t[dh][^>]*>(.*?)</t[dh]>").unwrap();
    pub static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();

    // Embedded member objects: "name" ... "relation" ... optional "birth_year"
    pub static ref KEY_VALUE_MEMBER: Regex = Regex::new(
        r#"(?i)"(?:name|ho_ten)"\s*:\s*"(?P<name>[^"]*)"[^{}]*?"(?:relation|relationship|quan_he)"\s*:\s*"(?P<rel>[^"]*)"(?:[^{}]*?"(?:birth_year|nam_sinh)"\s*:\s*"?(?P<year>\d{4}))?"#
    ).unwrap();

    // Last-resort member segment separators
    pub static ref SEGMENT_SPLIT: Regex = Regex::new(r"[,;\n]").unwrap();
}
