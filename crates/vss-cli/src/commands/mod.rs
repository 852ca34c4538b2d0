//! Subcommands and the helpers they share.

pub mod analyze;
pub mod batch;
pub mod config;
pub mod extract;
pub mod fields;

use std::path::{Path, PathBuf};

use tracing::debug;

use vss_core::{EngineConfig, ExtractionEngine, ReferenceRecord};

/// `<config_dir>/vssx/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vssx")
        .join("config.json")
}

/// Load the explicit config file, else the default one if it exists, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<EngineConfig> {
    if let Some(path) = config_path {
        let path = Path::new(path);
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(EngineConfig::from_file(path)?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config from {}", default_path.display());
        Ok(EngineConfig::from_file(&default_path)?)
    } else {
        Ok(EngineConfig::default())
    }
}

pub fn build_engine(config_path: Option<&str>) -> anyhow::Result<ExtractionEngine> {
    let config = load_config(config_path)?;
    Ok(ExtractionEngine::new(config)?)
}

/// Read a reference record from a JSON object file.
pub fn load_reference(path: &Path) -> anyhow::Result<ReferenceRecord> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    Ok(ReferenceRecord::from_json(&value)?)
}

/// Parse `key=value` pairs into a reference record.
pub fn parse_assignments(pairs: &[String]) -> anyhow::Result<ReferenceRecord> {
    let mut record = ReferenceRecord::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            anyhow::bail!("Expected key=value, got: {}", pair);
        };
        if key.trim().is_empty() {
            anyhow::bail!("Empty key in: {}", pair);
        }
        record.insert(key, value.trim());
    }
    Ok(record)
}
