//! Data models for extraction results, configuration and lookup tables.

pub mod config;
pub mod report;
pub mod tables;
pub mod value;

pub use config::{EngineConfig, ExtractionConfig, UnitScope, ValidationConfig};
pub use report::{
    CrossCheckStatus, CrossValidationRecord, CrossValidationReport, DocumentShape,
    ExtractionMetadata, ExtractionReport, ExtractionResult, ExtractionSummary, QualityMetrics,
    QualityTier, ReferenceRecord, ShapeClass,
};
pub use tables::{BankEntry, LookupTables, UnitMultiplier};
pub use value::{BankMatch, Candidate, Income, MatchType, Member, NormalizedValue, StrategyKind};
