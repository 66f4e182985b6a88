use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use pos_ecl::{
    cli::{build_reports, list_tables, run_pipeline},
    clean::RulePreset,
    config::{Overrides, Settings},
    store::LoadStrategy,
};
use std::path::PathBuf;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Point-of-sale ECL: extract the source tables, clean them and load them into
/// an analytical PostgreSQL database
#[derive(Parser)]
#[command(name = "posecl", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source connection URLs from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// YAML config file (defaults to ecl.yml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, clean and load every source table into <table>_clean
    Run {
        /// Comma-separated list of source tables to process
        #[arg(short, long)]
        tables: Option<String>,

        /// How destination tables are replaced: replace or staging
        #[arg(short, long)]
        strategy: Option<LoadStrategy>,

        /// Drop empty tables from the source database
        #[arg(long)]
        drop_empty_source: bool,

        /// Cleaning rule set: default or legacy
        #[arg(short, long)]
        rules: Option<RulePreset>,
    },

    /// List the source tables the pipeline would process
    Tables {
        /// Comma-separated list of source tables to process
        #[arg(short, long)]
        tables: Option<String>,
    },

    /// Build the aggregate report tables from the cleaned tables
    Report {
        /// Comma-separated list of reports to build
        #[arg(short, long, value_delimiter = ',')]
        only: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match dotenvy::from_filename(&cli.env) {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => log::debug!("No {} file found", cli.env),
        Err(e) => return Err(e.into()),
    }

    let mut overrides = Overrides {
        config: cli.config,
        ..Default::default()
    };

    match cli.command {
        Commands::Run {
            tables,
            strategy,
            drop_empty_source,
            rules,
        } => {
            overrides.tables = tables;
            overrides.strategy = strategy;
            overrides.drop_empty_source = drop_empty_source;
            overrides.rules = rules;
            let settings = Settings::load(&overrides)?;

            log::info!("Starting ECL run");
            let summary = run_pipeline(&settings).await?;
            if summary.failed() > 0 {
                log::warn!(
                    "Run completed with {} failed table(s)",
                    summary.failed().red()
                );
            } else {
                log::info!("Run completed");
            }
        }
        Commands::Tables { tables } => {
            overrides.tables = tables;
            let settings = Settings::load(&overrides)?;
            list_tables(&settings).await?;
        }
        Commands::Report { only } => {
            let settings = Settings::load(&overrides)?;
            log::info!(
                "Building {} report(s)",
                match only.is_empty() {
                    true => "all".to_string(),
                    false => only.join(", "),
                }
                .cyan()
            );
            build_reports(&settings, &only).await?;
        }
    }

    Ok(())
}
