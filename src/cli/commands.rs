use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::ingest::{SourceFormat, TableLoader};
use crate::pipeline::{Pipeline, RunReport};
use crate::summary::{latest_period, performers, read_table, top_by_registrations};
use crate::types::{SourceKind, TableKind};
use crate::writer::{export_workbook, write_clean_table};
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::debug;

const WATCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Load the config file (or defaults) and apply directory overrides.
///
/// When only `data_dir` is overridden the output follows it into
/// `<data_dir>/processed`.
pub fn resolve_config(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> PipelineResult<PipelineConfig> {
    let mut resolved = match config {
        Some(path) => {
            if !path.exists() {
                return Err(PipelineError::NotFound(path));
            }
            PipelineConfig::load(&path)?
        }
        None => PipelineConfig::default(),
    };

    match (data_dir, output_dir) {
        (Some(data), Some(output)) => {
            resolved.data_dir = data;
            resolved.output_dir = output;
        }
        (Some(data), None) => {
            resolved.output_dir = data.join("processed");
            resolved.data_dir = data;
        }
        (None, Some(output)) => resolved.output_dir = output,
        (None, None) => {}
    }
    resolved.validate()?;
    Ok(resolved)
}

/// Execute the run command
pub fn run(
    config: PipelineConfig,
    xlsx: Option<PathBuf>,
    report_path: Option<PathBuf>,
    strict: bool,
    verbose: bool,
) -> PipelineResult<()> {
    println!("{}", "🚗 regstats - Pipeline Run".bold().green());
    println!("   Data:   {}", config.data_dir.display());
    println!("   Output: {}\n", config.output_dir.display());

    let pipeline = Pipeline::new(config);
    let run = pipeline.run()?;
    print_report(&run.report, verbose);

    if let Some(path) = xlsx {
        let tables = run.written();
        export_workbook(&path, &tables)?;
        println!(
            "\n{} {} ({} sheets)",
            "📊 Workbook written:".bold().green(),
            path.display(),
            tables.len()
        );
    }

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&run.report)?;
        fs::write(&path, json)?;
        println!("{} {}", "📝 Report written:".cyan(), path.display());
    }

    if strict && !run.report.is_complete() {
        return Err(PipelineError::Incomplete(run.report.skipped.len()));
    }

    println!("\n{}", "✅ Run complete".bold().green());
    Ok(())
}

fn print_report(report: &RunReport, verbose: bool) {
    println!("{}", "📋 Tables:".bold());
    for table in &report.tables {
        println!(
            "   {} {:<38} {:>6} rows",
            "✓".green(),
            table.path.display().to_string(),
            table.rows
        );
        if table.undefined_growth > 0 {
            println!(
                "     {} growth undefined on zero baseline",
                table.undefined_growth.to_string().yellow()
            );
        }
    }
    for kind in &report.unwritten {
        println!(
            "   {} {} not written (no sources loaded)",
            "⊘".yellow(),
            kind.file_name()
        );
    }

    if !report.skipped.is_empty() {
        println!("\n{}", "❌ Skipped sources:".bold().red());
        for skipped in &report.skipped {
            println!("   {}: {}", skipped.path.display(), skipped.reason.red());
        }
    }

    if !report.drift.is_empty() {
        println!("\n{}", "⚠️  Schema drift:".bold().yellow());
        for drift in &report.drift {
            println!("   {}", drift);
        }
    }

    if !report.diagnostics.is_empty() {
        let unmatched = report.diagnostics.iter().filter(|d| d.is_unmatched()).count();
        println!(
            "\n{} {} unmatched, {} ambiguous",
            "⚠️  Category mapping:".bold().yellow(),
            unmatched,
            report.diagnostics.len() - unmatched
        );
        if verbose {
            for diagnostic in &report.diagnostics {
                println!("   {}", diagnostic);
            }
        }
    }

    if verbose && !report.missing.is_empty() {
        println!("\n{}", "Missing monthly sources:".cyan());
        for path in &report.missing {
            println!("   {}", path.display());
        }
    }
}

/// Execute the clean command: normalize one source into a wide CSV
pub fn clean(
    input: PathBuf,
    output: PathBuf,
    kind: SourceKind,
    config: PipelineConfig,
    header_rows: Option<usize>,
    verbose: bool,
) -> PipelineResult<()> {
    println!("{}", "🧹 regstats - Clean Source".bold().green());
    println!("   Input:  {}", input.display());
    println!("   Output: {}\n", output.display());

    let mut schema = config.schema(kind);
    if let Some(rows) = header_rows {
        schema.header_rows = rows;
    }

    let table = TableLoader::new(&input, schema).load()?;
    if let Some(drift) = &table.drift {
        println!("{} {}", "⚠️  Schema drift:".bold().yellow(), drift);
    }
    if verbose {
        let nulls: usize = table
            .records
            .iter()
            .map(|r| r.values.iter().filter(|v| v.is_none()).count())
            .sum();
        println!("   {} null cells", nulls);
    }

    let rows = write_clean_table(&output, kind, &table)?;
    println!("{} {} rows", "✅ Cleaned".bold().green(), rows);
    Ok(())
}

/// Execute the watch command: rerun the pipeline when sources change
pub fn watch(config: PipelineConfig, verbose: bool) -> PipelineResult<()> {
    println!("{}", "👁️  regstats - Watch Mode".bold().green());
    println!("   Watching: {}", config.data_dir.display());
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !config.data_dir.is_dir() {
        return Err(PipelineError::NotFound(config.data_dir.clone()));
    }
    fs::create_dir_all(&config.output_dir)?;
    let output_dir = config
        .output_dir
        .canonicalize()
        .unwrap_or_else(|_| config.output_dir.clone());

    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(WATCH_DEBOUNCE, tx)
        .map_err(|e| PipelineError::Config(format!("Failed to create file watcher: {}", e)))?;
    debouncer
        .watcher()
        .watch(&config.data_dir, RecursiveMode::Recursive)
        .map_err(|e| PipelineError::Config(format!("Failed to watch directory: {}", e)))?;

    let pipeline = Pipeline::new(config);

    println!("{}", "🔄 Initial run...".cyan());
    run_watch_action(&pipeline, verbose);
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && is_source_change(&event.path, &output_dir)
                });
                if relevant {
                    println!(
                        "\n{} {}",
                        "🔄 Change detected at".cyan(),
                        chrono::Utc::now().format("%H:%M:%S UTC").to_string().cyan()
                    );
                    run_watch_action(&pipeline, verbose);
                    println!();
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

/// A change counts when it touches a readable source outside the output directory
fn is_source_change(path: &Path, output_dir: &Path) -> bool {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if path.starts_with(output_dir) {
        debug!(path = %path.display(), "ignoring change in output directory");
        return false;
    }
    SourceFormat::detect(&path).is_some()
}

fn run_watch_action(pipeline: &Pipeline, verbose: bool) {
    match pipeline.run() {
        Ok(run) => {
            print_report(&run.report, verbose);
            println!("{}", "✅ Run complete".bold().green());
        }
        Err(e) => println!("{} {}", "❌ Run failed:".bold().red(), e),
    }
}

/// Execute the summary command over previously written tables
pub fn summary(config: PipelineConfig, period: Option<String>, top: usize) -> PipelineResult<()> {
    println!("{}", "📈 regstats - Summary".bold().green());
    println!("   Tables: {}\n", config.output_dir.display());

    let mut found = 0;
    for kind in TableKind::ALL {
        let path = config.output_dir.join(kind.file_name());
        if !path.exists() {
            println!("{} {} (not found)", "⊘".yellow(), kind.file_name());
            continue;
        }
        found += 1;

        let rows = read_table(&path, kind)?;
        let Some(selected) = period.clone().or_else(|| latest_period(&rows).map(String::from))
        else {
            println!("{} {} (empty)", "⊘".yellow(), kind.file_name());
            continue;
        };

        println!("{} {}", kind.sheet_name().bold(), format!("[{}]", selected).cyan());
        match performers(&rows, &selected) {
            Some(p) => {
                println!(
                    "   Best:  {:<24} {:>8.2}%",
                    p.best.entity,
                    p.best.growth.unwrap_or_default()
                );
                println!(
                    "   Worst: {:<24} {:>8.2}%",
                    p.worst.entity,
                    p.worst.growth.unwrap_or_default()
                );
            }
            None => println!("   {}", "no growth values in this period".yellow()),
        }

        if kind == TableKind::AnnualMaker || kind == TableKind::QuarterlyMaker {
            println!("   Top {} by registrations:", top);
            for (rank, (entity, total)) in top_by_registrations(&rows, top).iter().enumerate() {
                println!("   {:>3}. {:<24} {:>12}", rank + 1, entity, total);
            }
        }
        println!();
    }

    if found == 0 {
        return Err(PipelineError::NotFound(config.output_dir));
    }
    Ok(())
}
