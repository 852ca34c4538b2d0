//! Configuration structures for the extraction engine.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::tables::LookupTables;
use crate::error::{Result, VssError};

/// Main configuration for the extraction engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Strategy and scoring configuration.
    pub extraction: ExtractionConfig,

    /// Validation thresholds.
    pub validation: ValidationConfig,

    /// Reference data used by normalizers and validators.
    pub tables: LookupTables,
}

/// Where the income normalizer looks for a unit multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitScope {
    /// Only the raw candidate text.
    Candidate,
    /// The candidate first, then full-word units anywhere in the document
    /// text. Can pick up a unit that belongs to a different number.
    Document,
}

/// Strategy and scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Documents longer than this many characters are truncated before matching.
    pub max_document_chars: usize,

    /// Fallback matches shorter than this many characters are discarded.
    pub fallback_min_length: usize,

    /// Confidence subtracted per validation error.
    pub validation_penalty: f64,

    /// Weight bonus for member-list candidates that parse into at least one member.
    pub data_presence_bonus: f64,

    /// Scope of the income unit-multiplier search.
    pub income_unit_scope: UnitScope,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_document_chars: 1_000_000,
            fallback_min_length: 4,
            validation_penalty: 0.1,
            data_presence_bonus: 0.2,
            income_unit_scope: UnitScope::Candidate,
        }
    }
}

/// Validation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Smallest plausible monthly income in VND.
    pub income_min: u64,

    /// Largest plausible monthly income in VND.
    pub income_max: u64,

    /// Relative difference accepted when comparing income with a reference record.
    pub income_tolerance: f64,

    /// Earliest plausible birth year for a household member.
    pub birth_year_min: u16,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            income_min: 100_000,
            income_max: 100_000_000,
            income_tolerance: 0.10,
            birth_year_min: 1900,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values no extraction run could work with.
    pub fn check(&self) -> Result<()> {
        if self.extraction.max_document_chars == 0 {
            return Err(VssError::Config(
                "extraction.max_document_chars must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.extraction.validation_penalty) {
            return Err(VssError::Config(format!(
                "extraction.validation_penalty must be within 0..=1, got {}",
                self.extraction.validation_penalty
            )));
        }
        if self.validation.income_min > self.validation.income_max {
            return Err(VssError::Config(format!(
                "validation.income_min ({}) exceeds validation.income_max ({})",
                self.validation.income_min, self.validation.income_max
            )));
        }
        if self.tables.unit_multipliers.iter().any(|m| m.factor == 0) {
            return Err(VssError::Config(
                "tables.unit_multipliers factors must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
