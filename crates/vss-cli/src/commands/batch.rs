//! Batch command - extract fields from many documents.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use vss_core::{ExtractionEngine, ExtractionReport, ReferenceRecord};

use super::build_engine;
use super::extract::{display_value, format_report, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input documents
    #[arg(required = true)]
    input: String,

    /// CSV of reference records, keyed by a `file` column
    #[arg(short, long)]
    references: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also write a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome for one file.
struct FileResult {
    path: PathBuf,
    report: Option<ExtractionReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let engine = Arc::new(build_engine(config_path)?);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "html" | "htm" | "txt")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    let references = match &args.references {
        Some(path) => Arc::new(load_references(path)?),
        None => Arc::new(HashMap::new()),
    };

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = semaphore.clone().acquire_owned().await?;
        let engine = engine.clone();
        let references = references.clone();
        let pb = pb.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let result = process_file(&engine, &path, &references);
            drop(permit);
            pb.inc(1);
            result
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await?;
        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                pb.abandon();
                anyhow::bail!("Processing failed: {}", error_msg);
            }
        }
        results.push(result);
    }

    pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        let paths: Vec<&Path> = results.iter().map(|r| r.path.as_path()).collect();
        let stems = output_stems(&paths);
        for (result, stem) in results.iter().zip(&stems) {
            let Some(report) = &result.report else {
                continue;
            };
            let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));
            fs::write(&output_path, format_report(report, args.format, false)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results, engine.registry().field_names())?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.report.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    let reports: Vec<&ExtractionReport> = results.iter().filter_map(|r| r.report.as_ref()).collect();
    if !reports.is_empty() {
        println!();
        println!("{}", style("Field success rates:").bold());
        for field in engine.registry().field_names() {
            let found = reports
                .iter()
                .filter(|r| r.field(field).is_some_and(|f| f.is_successful()))
                .count();
            println!(
                "  {:<16} {:>5.1}% ({}/{})",
                field,
                found as f64 * 100.0 / reports.len() as f64,
                found,
                reports.len()
            );
        }
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_file(
    engine: &ExtractionEngine,
    path: &Path,
    references: &HashMap<String, ReferenceRecord>,
) -> FileResult {
    let file_start = Instant::now();
    let reference = file_name(path).and_then(|name| references.get(name));

    let outcome = fs::read(path)
        .map_err(anyhow::Error::from)
        .and_then(|bytes| Ok(engine.extract_bytes(&bytes, reference)?));

    let processing_time_ms = file_start.elapsed().as_millis() as u64;
    match outcome {
        Ok(report) => FileResult {
            path: path.to_path_buf(),
            report: Some(report),
            error: None,
            processing_time_ms,
        },
        Err(e) => FileResult {
            path: path.to_path_buf(),
            report: None,
            error: Some(e.to_string()),
            processing_time_ms,
        },
    }
}

/// One output stem per input, unique within the batch.
///
/// Inputs sharing a stem (same name in different directories, or
/// `page.html` next to `page.htm`) keep it for the first occurrence; later
/// ones get the first free `-2`, `-3`, ... suffix.
fn output_stems(paths: &[&Path]) -> Vec<String> {
    let stems: Vec<String> = paths
        .iter()
        .map(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document")
                .to_string()
        })
        .collect();

    let mut used: HashSet<String> = stems.iter().cloned().collect();
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(stems.len());

    for (path, stem) in paths.iter().zip(stems) {
        if seen.insert(stem.clone()) {
            unique.push(stem);
            continue;
        }
        let renamed = (2..)
            .map(|n| format!("{}-{}", stem, n))
            .find(|candidate| !used.contains(candidate))
            .unwrap_or_else(|| stem.clone());
        warn!(
            "Output name {} already taken, writing {} as {}",
            stem,
            path.display(),
            renamed
        );
        used.insert(renamed.clone());
        unique.push(renamed);
    }
    unique
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|s| s.to_str())
}

/// Reference records keyed by file name.
///
/// The CSV needs a `file` column; every other non-empty cell becomes a
/// reference value under its column name.
fn load_references(path: &Path) -> anyhow::Result<HashMap<String, ReferenceRecord>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();
    let Some(file_column) = headers.iter().position(|h| h.trim() == "file") else {
        anyhow::bail!("Reference CSV {} has no 'file' column", path.display());
    };

    let mut references = HashMap::new();
    for row in rdr.records() {
        let row = row?;
        let Some(file) = row.get(file_column).map(str::trim).filter(|f| !f.is_empty()) else {
            continue;
        };
        let record: ReferenceRecord = headers
            .iter()
            .zip(row.iter())
            .enumerate()
            .filter(|(i, (_, value))| *i != file_column && !value.trim().is_empty())
            .map(|(_, (key, value))| (key, value.trim().to_string()))
            .collect();
        references.insert(file.to_string(), record);
    }

    debug!("Loaded {} reference records", references.len());
    Ok(references)
}

fn write_summary(path: &Path, results: &[FileResult], fields: &[String]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec![
        "filename".to_string(),
        "status".to_string(),
        "success_count".to_string(),
        "total_fields".to_string(),
        "success_rate".to_string(),
        "quality_score".to_string(),
        "quality".to_string(),
        "consistency".to_string(),
    ];
    for field in fields {
        header.push(field.clone());
        header.push(format!("{}_confidence", field));
    }
    header.push("processing_time_ms".to_string());
    header.push("error".to_string());
    wtr.write_record(&header)?;

    for result in results {
        let filename = file_name(&result.path).unwrap_or("");
        let mut row = vec![filename.to_string()];

        match &result.report {
            Some(report) => {
                let summary = &report.summary;
                row.push("success".to_string());
                row.push(summary.success_count.to_string());
                row.push(summary.total_fields.to_string());
                row.push(format!("{:.2}", summary.success_rate));
                row.push(format!("{:.2}", summary.overall_quality_score));
                row.push(summary.status.to_string());
                row.push(
                    report
                        .cross_validation
                        .as_ref()
                        .map(|c| format!("{:.2}", c.overall_consistency))
                        .unwrap_or_default(),
                );
                for field in fields {
                    match report.field(field) {
                        Some(f) => {
                            row.push(display_value(f));
                            row.push(format!("{:.2}", f.confidence));
                        }
                        None => {
                            row.push(String::new());
                            row.push(String::new());
                        }
                    }
                }
            }
            None => {
                row.push("error".to_string());
                row.extend(std::iter::repeat_n(String::new(), 6 + fields.len() * 2));
            }
        }

        row.push(result.processing_time_ms.to_string());
        row.push(result.error.clone().unwrap_or_default());
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
