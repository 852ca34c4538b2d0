//! Core library for VSS portal field extraction.
//!
//! This crate provides:
//! - HTML parsing and structural analysis of lookup result pages
//! - A pattern registry per field (selectors, regexes, context keywords, paths)
//! - A strategy cascade with confidence arbitration
//! - Normalizers for phone numbers, VND incomes, banks, household codes and members
//! - Validation and cross-validation against a reference record

pub mod document;
pub mod engine;
pub mod error;
pub mod fields;
pub mod models;
pub mod registry;
pub mod strategy;

pub use document::ParsedDocument;
pub use engine::ExtractionEngine;
pub use error::{ExtractionError, RegistryError, Result, VssError};
pub use fields::{
    is_valid_household_code, is_valid_phone, normalize_bank, normalize_household_code,
    normalize_income, normalize_phone, Normalized, NormalizerKind, ValidationRule,
};
pub use models::{
    CrossValidationReport, DocumentShape, EngineConfig, ExtractionMetadata, ExtractionReport,
    ExtractionResult, ExtractionSummary, LookupTables, NormalizedValue, QualityMetrics,
    QualityTier, ReferenceRecord, StrategyKind,
};
pub use registry::{FieldPatterns, FieldSpec, PatternRegistry};
pub use strategy::ExtractionStrategy;
