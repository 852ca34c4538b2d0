//! WASM bindings for VSS portal field extraction.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use vss_core::{EngineConfig, ExtractionEngine, ExtractionReport, ReferenceRecord};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Extract all fields from an HTML document with the default configuration.
///
/// `reference_json` is an optional JSON object to cross-validate against.
#[wasm_bindgen]
pub fn extract_fields(html: &str, reference_json: Option<String>) -> Result<JsValue, JsValue> {
    let engine = ExtractionEngine::new(EngineConfig::default()).map_err(to_js_error)?;
    let report = run_extraction(&engine, html, reference_json.as_deref())?;
    to_js(&report)
}

/// Normalize a Vietnamese phone number (e.g. "+84 912 345 678" to "0912345678").
#[wasm_bindgen]
pub fn normalize_phone(raw: &str) -> String {
    vss_core::normalize_phone(raw).value.to_string()
}

/// Whether a normalized phone number has a valid mobile format.
#[wasm_bindgen]
pub fn is_valid_phone(phone: &str) -> bool {
    vss_core::is_valid_phone(phone)
}

/// Normalize a household code (uppercase, whitespace removed).
#[wasm_bindgen]
pub fn normalize_household_code(raw: &str) -> String {
    vss_core::normalize_household_code(raw).value.to_string()
}

/// Field extractor class for browser use.
///
/// Holds a compiled engine so repeated extractions skip pattern compilation.
#[wasm_bindgen]
pub struct FieldExtractor {
    engine: ExtractionEngine,
}

#[wasm_bindgen]
impl FieldExtractor {
    /// Create an extractor with the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<FieldExtractor, JsValue> {
        let engine = ExtractionEngine::new(EngineConfig::default()).map_err(to_js_error)?;
        Ok(Self { engine })
    }

    /// Create an extractor from a JSON configuration.
    #[wasm_bindgen]
    pub fn with_config(config_json: &str) -> Result<FieldExtractor, JsValue> {
        let engine = engine_from_json(config_json).map_err(|e| JsValue::from_str(&e))?;
        Ok(Self { engine })
    }

    /// Extract all fields.
    #[wasm_bindgen]
    pub fn extract(&self, html: &str, reference_json: Option<String>) -> Result<JsValue, JsValue> {
        let report = run_extraction(&self.engine, html, reference_json.as_deref())?;
        to_js(&report)
    }

    /// Structural shape of a document.
    #[wasm_bindgen]
    pub fn analyze(&self, html: &str) -> Result<JsValue, JsValue> {
        to_js(&self.engine.analyze(html))
    }

    /// Registered field names, in extraction order.
    #[wasm_bindgen]
    pub fn field_names(&self) -> Vec<String> {
        self.engine.registry().field_names().to_vec()
    }
}

fn engine_from_json(config_json: &str) -> Result<ExtractionEngine, String> {
    let config: EngineConfig = serde_json::from_str(config_json).map_err(|e| e.to_string())?;
    ExtractionEngine::new(config).map_err(|e| e.to_string())
}

fn parse_reference(reference_json: Option<&str>) -> Result<Option<ReferenceRecord>, String> {
    let Some(json) = reference_json.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
    ReferenceRecord::from_json(&value)
        .map(Some)
        .map_err(|e| e.to_string())
}

fn run_extraction(
    engine: &ExtractionEngine,
    html: &str,
    reference_json: Option<&str>,
) -> Result<ExtractionReport, JsValue> {
    let reference = parse_reference(reference_json).map_err(|e| JsValue::from_str(&e))?;
    Ok(engine.extract_fields(html, reference.as_ref()))
}

/// Plain objects rather than ES `Map`s for the report's maps.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js_error(e: vss_core::VssError) -> JsValue {
    JsValue::from_str(&e.to_string())
}
