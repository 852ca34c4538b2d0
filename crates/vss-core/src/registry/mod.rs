//! Field pattern registry.
//!
//! A [`FieldSpec`] bundles everything the strategies and normalizers need for
//! one field: compiled selectors, regexes, context keywords, path
//! expressions, fallback regexes, validation rules and the normalizer kind.
//! The registry is built once and shared read-only between extraction calls.

mod defaults;
pub mod query;

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RegistryError;
use crate::fields::{NormalizerKind, ValidationRule};

pub use query::{PathPattern, SelectorPattern, SiblingPath};

pub const PHONE: &str = "phone";
pub const INCOME: &str = "income";
pub const BANK: &str = "bank";
pub const HOUSEHOLD_CODE: &str = "household_code";
pub const MEMBERS: &str = "members";

/// Uncompiled pattern lists for one field, as stored in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldPatterns {
    /// Structural selectors, tried in order.
    pub selectors: Vec<String>,

    /// Regexes run case-insensitively against the raw document.
    pub regexes: Vec<String>,

    /// Label words searched in text nodes.
    pub context_keywords: Vec<String>,

    /// Path expressions; only the sibling shape is executed.
    pub paths: Vec<String>,

    /// Loose regexes used when nothing else matched.
    pub fallbacks: Vec<String>,

    pub validation_rules: Vec<ValidationRule>,

    pub normalizer: NormalizerKind,

    /// Whether several matched elements are concatenated into one candidate.
    pub multi_valued: bool,

    /// Keys looked up, in order, in a reference record.
    pub reference_keys: Vec<String>,

    /// Cell texts identifying table header rows.
    pub header_tokens: Vec<String>,
}

/// Compiled patterns for one field.
#[derive(Debug)]
pub struct FieldSpec {
    name: String,
    patterns: FieldPatterns,
    selectors: Vec<SelectorPattern>,
    regexes: Vec<Regex>,
    keywords: Vec<String>,
    paths: Vec<PathPattern>,
    fallbacks: Vec<Regex>,
    header_tokens: Vec<String>,
}

impl FieldSpec {
    /// Compile the pattern lists of `field`.
    pub fn compile(field: &str, patterns: FieldPatterns) -> Result<Self, RegistryError> {
        let invalid = |pattern: &str, reason: String| RegistryError::InvalidPattern {
            field: field.to_string(),
            pattern: pattern.to_string(),
            reason,
        };

        let selectors = patterns
            .selectors
            .iter()
            .map(|s| SelectorPattern::compile(s).map_err(|reason| invalid(s, reason)))
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = patterns
            .regexes
            .iter()
            .map(|r| {
                RegexBuilder::new(r)
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                    .map_err(|e| invalid(r, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fallbacks = patterns
            .fallbacks
            .iter()
            .map(|r| Regex::new(r).map_err(|e| invalid(r, e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        let paths: Vec<PathPattern> = patterns.paths.iter().map(|p| PathPattern::parse(p)).collect();
        let executable = paths.iter().filter(|p| p.sibling().is_some()).count();
        if executable < paths.len() {
            debug!(
                "{}: {} of {} path expressions use an unsupported shape",
                field,
                paths.len() - executable,
                paths.len()
            );
        }

        let lowered = |words: &[String]| -> Vec<String> {
            words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };

        Ok(Self {
            name: field.to_string(),
            keywords: lowered(&patterns.context_keywords),
            header_tokens: lowered(&patterns.header_tokens),
            selectors,
            regexes,
            paths,
            fallbacks,
            patterns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source pattern lists.
    pub fn patterns(&self) -> &FieldPatterns {
        &self.patterns
    }

    pub fn selectors(&self) -> &[SelectorPattern] {
        &self.selectors
    }

    pub fn regexes(&self) -> &[Regex] {
        &self.regexes
    }

    /// Lowercased context keywords.
    pub fn context_keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn paths(&self) -> &[PathPattern] {
        &self.paths
    }

    pub fn fallbacks(&self) -> &[Regex] {
        &self.fallbacks
    }

    /// Lowercased header tokens.
    pub fn header_tokens(&self) -> &[String] {
        &self.header_tokens
    }

    pub fn normalizer(&self) -> NormalizerKind {
        self.patterns.normalizer
    }

    pub fn validation_rules(&self) -> &[ValidationRule] {
        &self.patterns.validation_rules
    }

    pub fn is_multi_valued(&self) -> bool {
        self.patterns.multi_valued
    }
}

/// Field specs in registration order.
#[derive(Debug, Default)]
pub struct PatternRegistry {
    order: Vec<String>,
    specs: HashMap<String, FieldSpec>,
}

impl PatternRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The five fields of the VSS lookup portal.
    pub fn with_defaults() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (name, patterns) in defaults::default_patterns() {
            registry.register_patterns(name, patterns, false)?;
        }
        Ok(registry)
    }

    pub fn get_spec(&self, name: &str) -> Result<&FieldSpec, RegistryError> {
        self.specs
            .get(name)
            .ok_or_else(|| RegistryError::UnknownField(name.to_string()))
    }

    /// Register a compiled spec under `name`.
    ///
    /// An existing field keeps its position when overwritten.
    pub fn register_field(
        &mut self,
        name: &str,
        mut spec: FieldSpec,
        overwrite: bool,
    ) -> Result<(), RegistryError> {
        if self.specs.contains_key(name) {
            if !overwrite {
                return Err(RegistryError::DuplicateField(name.to_string()));
            }
        } else {
            self.order.push(name.to_string());
        }
        spec.name = name.to_string();
        self.specs.insert(name.to_string(), spec);
        debug!("Registered field {}", name);
        Ok(())
    }

    /// Compile and register pattern lists.
    pub fn register_patterns(
        &mut self,
        name: &str,
        patterns: FieldPatterns,
        overwrite: bool,
    ) -> Result<(), RegistryError> {
        let spec = FieldSpec::compile(name, patterns)?;
        self.register_field(name, spec, overwrite)
    }

    /// Field names in registration order.
    pub fn field_names(&self) -> &[String] {
        &self.order
    }

    /// Specs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.order.iter().filter_map(|name| self.specs.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_in_order() {
        let registry = PatternRegistry::with_defaults().unwrap();
        assert_eq!(
            registry.field_names(),
            &[PHONE, INCOME, BANK, HOUSEHOLD_CODE, MEMBERS]
        );
        assert_eq!(registry.len(), 5);

        let members = registry.get_spec(MEMBERS).unwrap();
        assert!(members.is_multi_valued());
        assert_eq!(members.normalizer(), NormalizerKind::Members);
        assert!(members.header_tokens().contains(&"họ tên".to_string()));
        assert!(!registry.get_spec(PHONE).unwrap().is_multi_valued());
    }

    #[test]
    fn test_every_default_field_has_patterns() {
        let registry = PatternRegistry::with_defaults().unwrap();
        for spec in registry.iter() {
            assert!(!spec.selectors().is_empty(), "{}", spec.name());
            assert!(!spec.regexes().is_empty(), "{}", spec.name());
            assert!(!spec.fallbacks().is_empty(), "{}", spec.name());
            assert!(!spec.validation_rules().is_empty(), "{}", spec.name());
            assert!(!spec.patterns().reference_keys.is_empty(), "{}", spec.name());
        }
    }

    #[test]
    fn test_unknown_field() {
        let registry = PatternRegistry::with_defaults().unwrap();
        assert!(matches!(
            registry.get_spec("email"),
            Err(RegistryError::UnknownField(name)) if name == "email"
        ));
    }

    #[test]
    fn test_duplicate_field_requires_overwrite() {
        let mut registry = PatternRegistry::with_defaults().unwrap();
        let patterns = FieldPatterns {
            regexes: vec![r"Tel:\s*(\d+)".to_string()],
            ..Default::default()
        };

        let err = registry.register_patterns(PHONE, patterns.clone(), false);
        assert!(matches!(err, Err(RegistryError::DuplicateField(_))));

        registry.register_patterns(PHONE, patterns, true).unwrap();
        assert_eq!(registry.get_spec(PHONE).unwrap().regexes().len(), 1);
        // Position is kept
        assert_eq!(registry.field_names()[0], PHONE);
    }

    #[test]
    fn test_custom_field_appended() {
        let mut registry = PatternRegistry::with_defaults().unwrap();
        registry
            .register_patterns(
                "email",
                FieldPatterns {
                    regexes: vec![r"[\w.]+@[\w.]+".to_string()],
                    context_keywords: vec!["  Email ".to_string()],
                    ..Default::default()
                },
                false,
            )
            .unwrap();

        assert_eq!(registry.field_names().last().unwrap(), "email");
        let spec = registry.get_spec("email").unwrap();
        assert_eq!(spec.context_keywords(), &["email".to_string()]);
        assert_eq!(spec.normalizer(), NormalizerKind::Passthrough);
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        let bad_regex = FieldPatterns {
            regexes: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        match FieldSpec::compile("x", bad_regex) {
            Err(RegistryError::InvalidPattern { field, pattern, .. }) => {
                assert_eq!(field, "x");
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("unexpected result: {:?}", other.map(|s| s.name().to_string())),
        }

        let bad_selector = FieldPatterns {
            selectors: vec!["td[[".to_string()],
            ..Default::default()
        };
        assert!(FieldSpec::compile("x", bad_selector).is_err());
    }

    #[test]
    fn test_regexes_are_case_insensitive() {
        let registry = PatternRegistry::with_defaults().unwrap();
        let income = registry.get_spec(INCOME).unwrap();
        assert!(income.regexes()[0].is_match("LƯƠNG: 18000000 vnd"));
    }

    #[test]
    fn test_patterns_round_trip_through_json() {
        let patterns = FieldPatterns {
            selectors: vec!["td.phone".to_string()],
            validation_rules: vec![ValidationRule::PhoneFormat],
            normalizer: NormalizerKind::Phone,
            ..Default::default()
        };
        let json = serde_json::to_string(&patterns).unwrap();
        assert!(json.contains("\"phone_format\""));
        let parsed: FieldPatterns = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, patterns);

        let sparse: FieldPatterns = serde_json::from_str(r#"{"regexes": ["x"]}"#).unwrap();
        assert_eq!(sparse.normalizer, NormalizerKind::Passthrough);
    }
}
