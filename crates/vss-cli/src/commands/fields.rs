//! Fields command - list the registered fields.

use clap::Args;
use console::style;

use vss_core::FieldPatterns;

use super::build_engine;

/// Arguments for the fields command.
#[derive(Args)]
pub struct FieldsArgs {
    /// Print the full pattern lists as JSON
    #[arg(long)]
    patterns: bool,
}

pub async fn run(args: FieldsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let engine = build_engine(config_path)?;
    let registry = engine.registry();

    if args.patterns {
        let patterns: serde_json::Map<String, serde_json::Value> = registry
            .iter()
            .map(|spec| Ok((spec.name().to_string(), serde_json::to_value(spec.patterns())?)))
            .collect::<anyhow::Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&patterns)?);
        return Ok(());
    }

    println!(
        "{:<16} {:>9} {:>7} {:>8} {:>5} {:>9}  {}",
        style("field").bold(),
        "selectors",
        "regexes",
        "keywords",
        "paths",
        "fallbacks",
        "normalizer"
    );
    for spec in registry.iter() {
        let FieldPatterns {
            selectors,
            regexes,
            context_keywords,
            paths,
            fallbacks,
            ..
        } = spec.patterns();
        println!(
            "{:<16} {:>9} {:>7} {:>8} {:>5} {:>9}  {:?}{}",
            spec.name(),
            selectors.len(),
            regexes.len(),
            context_keywords.len(),
            paths.len(),
            fallbacks.len(),
            spec.normalizer(),
            if spec.is_multi_valued() { " (multi)" } else { "" }
        );
    }

    Ok(())
}
