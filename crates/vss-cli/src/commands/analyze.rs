//! Analyze command - report the structural shape of a document.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use super::build_engine;

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input document
    #[arg(required = true)]
    input: PathBuf,

    /// Print the shape as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let engine = build_engine(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let document = fs::read_to_string(&args.input)?;
    let shape = engine.analyze(&document);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&shape)?);
        return Ok(());
    }

    println!(
        "{} {}",
        style("Layout:").bold(),
        style(shape.shape_class.as_str()).cyan()
    );
    println!("  elements:     {}", shape.element_count);
    println!("  tables:       {}", shape.table_count);
    println!("  divs:         {}", shape.div_count);
    println!("  spans:        {}", shape.span_count);
    println!("  forms:        {}", shape.form_count);
    println!("  inputs:       {}", shape.input_count);
    println!("  text length:  {}", shape.text_length);
    println!(
        "  embedded data: {}",
        if shape.has_embedded_structured_data { "yes" } else { "no" }
    );

    Ok(())
}
