use anyhow::Context;
use clap::{Parser, Subcommand};
use regstats::cli;
use regstats::types::SourceKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regstats")]
#[command(about = "Vehicle registration statistics: clean, reshape, and measure growth.")]
#[command(long_about = "regstats - Vehicle registration statistics pipeline

Reads published registration sheets and writes four CSV tables:

  vehicle_category_group_yoy.csv      2W/3W/4W per year, YoY %
  maker_yoy.csv                       per maker per year, YoY %
  vehicle_category_quarterly_qoq.csv  2W/3W/4W per quarter, QoQ %
  maker_quarterly_qoq.csv             per maker per quarter, QoQ %

COMMANDS:
  run      - Build all four tables from the data directory
  clean    - Normalize a single source sheet into a wide CSV
  watch    - Rebuild tables whenever a source changes
  summary  - Best/worst growth and top makers from written tables

EXAMPLES:
  regstats run                           # data/ -> data/processed/
  regstats run --data-dir ./vahan --xlsx tables.xlsx
  regstats clean 2024_monthly_VC.xlsx -o vc_2024.csv --kind monthly-category
  regstats summary --top 5

LOGGING:
  Set RUST_LOG (e.g. RUST_LOG=regstats=debug) to control log output.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Build all four tables from the data directory.

Sources that cannot be read are skipped and reported; the remaining
tables are still written. A table with no readable source is not written.
Monthly workbooks missing for a configured year are simply skipped.

Use --strict to exit non-zero when any source was skipped.")]
    /// Build all four tables
    Run {
        /// Pipeline config file (YAML)
        #[arg(short, long, env = "REGSTATS_CONFIG")]
        config: Option<PathBuf>,

        /// Directory holding yearly/ and monthly/ sources
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Directory for the output tables (default: <data-dir>/processed)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Also export the tables as sheets of one Excel workbook
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Write the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Fail when any source was skipped
        #[arg(long)]
        strict: bool,

        /// Show mapping diagnostics and debug logs
        #[arg(short, long)]
        verbose: bool,
    },

    /// Normalize a single source sheet into a wide CSV
    Clean {
        /// Source sheet (.csv or Excel workbook)
        input: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Layout of the source sheet
        #[arg(short, long, value_enum)]
        kind: SourceKind,

        /// Pipeline config file (YAML)
        #[arg(short, long, env = "REGSTATS_CONFIG")]
        config: Option<PathBuf>,

        /// Leading title rows to skip
        #[arg(long)]
        header_rows: Option<usize>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Rebuild tables whenever a source changes.

Watches the data directory recursively. Changes inside the output
directory and non-source files are ignored. Events are debounced.")]
    /// Rebuild tables on source changes
    Watch {
        /// Pipeline config file (YAML)
        #[arg(short, long, env = "REGSTATS_CONFIG")]
        config: Option<PathBuf>,

        /// Directory holding yearly/ and monthly/ sources
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Directory for the output tables
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Best/worst growth and top makers from written tables
    Summary {
        /// Pipeline config file (YAML)
        #[arg(short, long, env = "REGSTATS_CONFIG")]
        config: Option<PathBuf>,

        /// Directory holding the written tables
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Period to report, e.g. 2024 or 2024-Q3 (default: latest)
        #[arg(short, long)]
        period: Option<String>,

        /// Number of makers to rank
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "regstats=debug"
    } else {
        "regstats=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data_dir,
            output_dir,
            xlsx,
            report,
            strict,
            verbose,
        } => {
            init_tracing(verbose);
            let config = cli::resolve_config(config, data_dir, output_dir)
                .context("failed to resolve pipeline config")?;
            cli::run(config, xlsx, report, strict, verbose)?;
        }

        Commands::Clean {
            input,
            output,
            kind,
            config,
            header_rows,
            verbose,
        } => {
            init_tracing(verbose);
            let config = cli::resolve_config(config, None, None)
                .context("failed to resolve pipeline config")?;
            cli::clean(input.clone(), output, kind, config, header_rows, verbose)
                .with_context(|| format!("failed to clean {}", input.display()))?;
        }

        Commands::Watch {
            config,
            data_dir,
            output_dir,
            verbose,
        } => {
            init_tracing(verbose);
            let config = cli::resolve_config(config, data_dir, output_dir)
                .context("failed to resolve pipeline config")?;
            cli::watch(config, verbose)?;
        }

        Commands::Summary {
            config,
            output_dir,
            period,
            top,
        } => {
            init_tracing(false);
            let config = cli::resolve_config(config, None, output_dir)
                .context("failed to resolve pipeline config")?;
            cli::summary(config, period, top)?;
        }
    }

    Ok(())
}
