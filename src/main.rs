//! cloneforge CLI entry point: wires the file enumerator, the Rust frontend,
//! and the analysis pipeline together, then reports recommendations.

use std::process::ExitCode;

use cloneforge::ast::ParsedUnit;
use cloneforge::error::{CloneForgeError, Result};
use cloneforge::namer::HeuristicNamer;
use cloneforge::resume::ResumeLog;
use cloneforge::{fileset, pipeline, Cli, PipelineReport};

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn run(cli: &Cli) -> Result<String> {
    let config = cli.resolve_config()?;

    if !config.base_path.exists() {
        return Err(CloneForgeError::Configuration { message: format!("{} does not exist", config.base_path.display()) });
    }

    let extensions = cli.extension_refs();
    let paths = fileset::enumerate_files(&config.base_path, &config.exclude_patterns, &extensions)?;

    if cli.verbose {
        tracing::info!(files = paths.len(), base_path = %config.base_path.display(), "enumerated source files");
    }

    let units = parse_all(&paths);
    if units.is_empty() {
        return Ok("No parseable source files found.\n".to_string());
    }

    let resume = match &cli.resume_file {
        Some(path) => ResumeLog::load(path)?,
        None => ResumeLog::default(),
    };
    let namer = HeuristicNamer;

    let report = pipeline::run(&units, &config, &namer, &resume);

    if let Some(metrics_path) = &cli.metrics_out {
        let metrics = cloneforge::metrics::RunMetrics::collect(report.files_scanned, &report.clusters, &report.recommendations);
        metrics.write_to(metrics_path)?;
    }

    Ok(format_report(&report, cli.format))
}

/// Parse every enumerated file with the bundled Rust frontend. Unparseable
/// files are skipped and logged (§7: `ParseError` degrades to a skipped
/// file, not an aborted run).
fn parse_all(paths: &[std::path::PathBuf]) -> Vec<ParsedUnit> {
    pipeline::parse_files(paths, |path| {
        cloneforge::frontend::rust::parse_file(path).map_err(|e| CloneForgeError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    })
}

fn format_report(report: &PipelineReport, format: cloneforge::cli::OutputFormat) -> String {
    match format {
        cloneforge::cli::OutputFormat::Json => format_json(report),
        cloneforge::cli::OutputFormat::Text => format_text(report),
    }
}

fn format_json(report: &PipelineReport) -> String {
    let entries: Vec<_> = report
        .clusters
        .iter()
        .zip(report.recommendations.iter())
        .map(|(cluster, rec)| {
            serde_json::json!({
                "strategy": rec.strategy.as_str(),
                "name": rec.name,
                "confidence": rec.confidence,
                "estimated_lines_saved": rec.estimated_lines_saved,
                "target_type": rec.target_type,
                "members": cluster.members.len(),
                "parameters": rec.parameters.iter().map(|p| serde_json::json!({
                    "name": p.name,
                    "type": p.ty.name,
                })).collect::<Vec<_>>(),
                "return_type": rec.return_type.ty.name,
            })
        })
        .collect();

    let skipped: Vec<_> = report
        .skipped
        .iter()
        .map(|s| {
            serde_json::json!({
                "file": s.primary_file.display().to_string(),
                "line": s.primary_line,
                "reason": s.reason.to_string(),
            })
        })
        .collect();

    let out = serde_json::json!({
        "files_scanned": report.files_scanned,
        "clusters": entries,
        "skipped": skipped,
    });
    format!("{}\n", serde_json::to_string_pretty(&out).unwrap_or_default())
}

fn format_text(report: &PipelineReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("files scanned: {}\n", report.files_scanned));
    out.push_str(&format!("duplicate clusters: {}\n\n", report.clusters.len()));

    for (cluster, rec) in report.clusters.iter().zip(report.recommendations.iter()) {
        out.push_str(&format!(
            "[{}] {} (confidence {:.2}, {} members, ~{} LOC saved)\n",
            rec.strategy.as_str(),
            rec.name,
            rec.confidence,
            cluster.members.len(),
            rec.estimated_lines_saved,
        ));
        out.push_str(&format!("  target: {}\n", rec.target_type));
        if rec.parameters.is_empty() {
            out.push_str("  parameters: none\n");
        } else {
            let params: Vec<String> = rec.parameters.iter().map(|p| format!("{}: {}", p.name, p.ty.name)).collect();
            out.push_str(&format!("  parameters: {}\n", params.join(", ")));
        }
        out.push_str(&format!("  returns: {}\n", rec.return_type.ty.name));
        out.push('\n');
    }

    if !report.skipped.is_empty() {
        out.push_str(&format!("skipped clusters: {}\n", report.skipped.len()));
        for s in &report.skipped {
            out.push_str(&format!("  {}:{} — {}\n", s.primary_file.display(), s.primary_line, s.reason));
        }
    }

    out
}
