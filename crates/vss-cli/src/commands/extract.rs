//! Extract command - pull fields out of a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use vss_core::models::CrossCheckStatus;
use vss_core::{ExtractionReport, ExtractionResult, QualityTier, ReferenceRecord};

use super::{build_engine, load_reference, parse_assignments};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input document (HTML or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Reference record (JSON object) to cross-validate against
    #[arg(short, long)]
    reference: Option<PathBuf>,

    /// Reference value as key=value (repeatable, overrides --reference)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON report
    Json,
    /// One CSV row per field
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let engine = build_engine(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let reference = reference_record(args.reference.as_deref(), &args.set)?;

    info!("Extracting fields from {}", args.input.display());
    let bytes = fs::read(&args.input)?;
    let report = engine.extract_bytes(&bytes, reference.as_ref())?;

    let output = format_report(&report, args.format, args.pretty)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Merge the JSON reference file with `--set` pairs. `None` when neither is given.
fn reference_record(
    path: Option<&std::path::Path>,
    pairs: &[String],
) -> anyhow::Result<Option<ReferenceRecord>> {
    let mut record = match path {
        Some(path) => load_reference(path)?,
        None if pairs.is_empty() => return Ok(None),
        None => ReferenceRecord::new(),
    };
    for (key, value) in parse_assignments(pairs)?.iter() {
        record.insert(key, value);
    }
    Ok(Some(record))
}

pub fn format_report(
    report: &ExtractionReport,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Json => Ok(serde_json::to_string(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_csv(report: &ExtractionReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "field",
        "value",
        "confidence",
        "quality",
        "quality_score",
        "strategy",
        "fallback_used",
        "errors",
        "warnings",
    ])?;

    for result in report.fields.values() {
        wtr.write_record([
            result.field.as_str(),
            &display_value(result),
            &format!("{:.2}", result.confidence),
            result.quality.as_str(),
            &format!("{:.2}", result.quality_metrics.overall_score),
            result.strategy.map(|s| s.as_str()).unwrap_or(""),
            if result.fallback_used { "true" } else { "false" },
            &result.validation_errors.join("; "),
            &result.validation_warnings.join("; "),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &ExtractionReport) -> String {
    let mut output = String::new();
    let shape = &report.document_shape;
    let summary = &report.summary;

    output.push_str(&format!(
        "Engine: {} at {}\n",
        report.metadata.engine,
        report.metadata.extracted_at.to_rfc3339()
    ));
    output.push_str(&format!(
        "Document: {} ({} elements, {} tables, {} forms)\n",
        shape.shape_class.as_str(),
        shape.element_count,
        shape.table_count,
        shape.form_count
    ));
    if report.input_truncated {
        output.push_str("Input was truncated\n");
    }
    output.push_str(&format!(
        "Status: {} ({}/{} fields, quality {:.2})\n",
        summary.status, summary.success_count, summary.total_fields, summary.overall_quality_score
    ));
    output.push('\n');

    for result in report.fields.values() {
        output.push_str(&format!(
            "{:<16} {:<40} {:.2} {} (score {:.2})",
            result.field,
            display_value(result),
            result.confidence,
            result.quality,
            result.quality_metrics.overall_score
        ));
        if let Some(strategy) = result.strategy {
            output.push_str(&format!(" [{}]", strategy));
        }
        output.push('\n');
        for error in &result.validation_errors {
            output.push_str(&format!("  error: {}\n", error));
        }
        for warning in &result.validation_warnings {
            output.push_str(&format!("  warning: {}\n", warning));
        }
    }

    if let Some(cross) = &report.cross_validation {
        output.push_str(&format!(
            "\nCross-validation: {:.0}% consistent\n",
            cross.overall_consistency * 100.0
        ));
        for record in cross.records.values() {
            if record.status != CrossCheckStatus::NoReference {
                output.push_str(&format!(
                    "  {:<16} {:?} ({:.2})\n",
                    record.field, record.status, record.similarity
                ));
            }
        }
        for inconsistency in &cross.inconsistencies {
            output.push_str(&format!("  ! {}\n", inconsistency));
        }
    }

    output
}

pub fn display_value(result: &ExtractionResult) -> String {
    match &result.value {
        Some(value) if result.quality != QualityTier::Failed => value.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vss_core::{EngineConfig, ExtractionEngine};

    const PAGE: &str = r#"<table>
        <tr><td>Điện thoại:</td><td>0912 345 678</td></tr>
        <tr><td>Mã hộ:</td><td>HGD202301234</td></tr>
    </table>"#;

    fn report() -> ExtractionReport {
        ExtractionEngine::new(EngineConfig::default())
            .unwrap()
            .extract_fields(PAGE, None)
    }

    #[test]
    fn test_csv_has_one_row_per_field() {
        let csv = format_report(&report(), OutputFormat::Csv, false).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("field,value,confidence"));
        assert!(csv.contains("phone,0912345678,1.00,excellent,0.98,selector,false"));
    }

    #[test]
    fn test_text_lists_errors() {
        let text = format_report(&report(), OutputFormat::Text, false).unwrap();
        assert!(text.starts_with("Engine: vss-core/"));
        assert!(text.contains("excellent (score 0.98)"));
        assert!(text.contains("household_code"));
        assert!(text.contains("error: no extraction pattern matched"));
    }

    #[test]
    fn test_reference_from_pairs_only() {
        assert!(reference_record(None, &[]).unwrap().is_none());
        let record = reference_record(None, &["phone=0912345678".to_string()])
            .unwrap()
            .unwrap();
        assert_eq!(record.get("phone"), Some("0912345678"));
    }
}
