//! Extraction engine.
//!
//! One call parses the document once, runs the strategy cascade for every
//! registered field, normalizes, validates and scores the winner, then
//! builds the summary and the optional cross-check against a reference
//! record. Field failures never abort the call.

pub mod arbiter;
pub mod summary;

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::document::ParsedDocument;
use crate::error::{ExtractionError, Result};
use crate::fields::{CrossValidator, Normalizers, Validators};
use crate::models::{
    DocumentShape, EngineConfig, ExtractionMetadata, ExtractionReport, ExtractionResult,
    LookupTables, QualityMetrics, QualityTier, ReferenceRecord, StrategyKind,
};
use crate::registry::{FieldSpec, PatternRegistry};

pub use arbiter::{score, Arbiter, Selection};
pub use summary::build_summary;

/// Error recorded for a field no strategy produced a candidate for.
pub const NO_MATCH: &str = "no extraction pattern matched";

/// Stateless field extractor. Shareable across threads.
pub struct ExtractionEngine {
    config: EngineConfig,
    registry: Arc<PatternRegistry>,
    tables: Arc<LookupTables>,
    normalizers: Normalizers,
    validators: Validators,
    cross: CrossValidator,
    arbiter: Arbiter,
}

impl ExtractionEngine {
    /// Engine with the default portal fields.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let registry = PatternRegistry::with_defaults()?;
        Self::with_registry(config, registry)
    }

    /// Engine with a custom registry and the standard strategies.
    pub fn with_registry(config: EngineConfig, registry: PatternRegistry) -> Result<Self> {
        let arbiter = Arbiter::standard(&config.extraction);
        Self::with_parts(config, registry, arbiter)
    }

    /// Engine with a custom registry and strategy arbiter.
    pub fn with_parts(
        config: EngineConfig,
        registry: PatternRegistry,
        arbiter: Arbiter,
    ) -> Result<Self> {
        config.check()?;
        let tables = Arc::new(config.tables.clone());
        let normalizers = Normalizers::new(tables.clone(), config.extraction.income_unit_scope)?;
        let validators = Validators::new(tables.clone(), config.validation.clone());
        let cross = CrossValidator::new(tables.clone(), config.validation.income_tolerance);

        info!(
            "Extraction engine ready with {} fields: {}",
            registry.len(),
            registry.field_names().join(", ")
        );

        Ok(Self {
            config,
            registry: Arc::new(registry),
            tables,
            normalizers,
            validators,
            cross,
            arbiter,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn tables(&self) -> &LookupTables {
        &self.tables
    }

    /// Extract every registered field from `document`.
    ///
    /// Never fails: fields that cannot be extracted come back as failed
    /// results. When `reference` is given, the report carries a
    /// cross-validation section.
    pub fn extract_fields(
        &self,
        document: &str,
        reference: Option<&ReferenceRecord>,
    ) -> ExtractionReport {
        let doc = ParsedDocument::parse(document, self.config.extraction.max_document_chars);
        debug!(
            "Document shape: {} ({} elements, {} tables)",
            doc.shape().shape_class.as_str(),
            doc.shape().element_count,
            doc.shape().table_count
        );

        let mut fields = BTreeMap::new();
        for spec in self.registry.iter() {
            let result = self.extract_field(&doc, spec);
            debug!(
                "{}: {} (confidence {:.2})",
                spec.name(),
                result.quality,
                result.confidence
            );
            fields.insert(spec.name().to_string(), result);
        }

        let summary = build_summary(&fields);
        let cross_validation = reference.map(|reference| {
            let pairs = self
                .registry
                .iter()
                .filter_map(|spec| fields.get(spec.name()).map(|result| (spec, result)));
            self.cross.validate(pairs, reference)
        });

        info!(
            "Extracted {}/{} fields, status {}",
            summary.success_count, summary.total_fields, summary.status
        );

        ExtractionReport {
            metadata: ExtractionMetadata::now(reference.is_some()),
            document_shape: doc.shape().clone(),
            input_truncated: doc.is_truncated(),
            fields,
            cross_validation,
            summary,
        }
    }

    /// Like [`extract_fields`](Self::extract_fields) for raw bytes.
    ///
    /// Fails only when the bytes are not UTF-8.
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        reference: Option<&ReferenceRecord>,
    ) -> Result<ExtractionReport> {
        let document = std::str::from_utf8(bytes).map_err(ExtractionError::from)?;
        Ok(self.extract_fields(document, reference))
    }

    /// Structural shape of a document without extracting anything.
    pub fn analyze(&self, document: &str) -> DocumentShape {
        ParsedDocument::parse(document, self.config.extraction.max_document_chars)
            .shape()
            .clone()
    }

    /// Extract one field. Strategy errors and panics become a failed result.
    pub fn extract_field(&self, doc: &ParsedDocument, spec: &FieldSpec) -> ExtractionResult {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run_field(doc, spec))) {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("{}: {}", spec.name(), e);
                ExtractionResult::failed(spec.name(), e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("{}: extraction panicked: {}", spec.name(), message);
                ExtractionResult::failed(spec.name(), format!("internal error: {}", message))
            }
        }
    }

    fn run_field(
        &self,
        doc: &ParsedDocument,
        spec: &FieldSpec,
    ) -> std::result::Result<ExtractionResult, ExtractionError> {
        let candidates = self.arbiter.collect(doc, spec)?;
        let selection = self.arbiter.select(candidates, spec.is_multi_valued(), |candidate| {
            self.normalizers
                .normalize(spec.normalizer(), &candidate.raw, doc.text())
        });

        let Some(selection) = selection else {
            debug!("{}: {}", spec.name(), NO_MATCH);
            return Ok(ExtractionResult::failed(spec.name(), NO_MATCH));
        };

        let report = self
            .validators
            .validate(spec.validation_rules(), &selection.normalized.value);
        let confidence = score(
            selection.weight,
            report.errors.len(),
            self.config.extraction.validation_penalty,
        );
        let strategy = selection.candidate.strategy;
        let fallback_used = strategy == StrategyKind::Fallback;
        let quality_metrics =
            QualityMetrics::assess(confidence, true, report.errors.len(), fallback_used);

        Ok(ExtractionResult {
            field: spec.name().to_string(),
            value: Some(selection.normalized.value),
            confidence,
            quality: QualityTier::from_confidence(confidence),
            strategy: Some(strategy),
            fallback_used,
            validation_errors: report.errors,
            validation_warnings: report.warnings,
            normalization_steps: selection.normalized.steps,
            quality_metrics,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
