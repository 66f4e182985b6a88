//! CLI helper functions

use crate::{
    clean::Cleaner,
    config::Settings,
    etl::{Catalog, Pipeline, RunOutcome, RunSummary},
    reports::{self, ReportOutcome},
    store::{PgDestination, SqlSource},
};
use eyre::Result;
use owo_colors::OwoColorize;

/// Run the ECL pipeline over every source table
///
/// Pipeline: SqlSource → Cleaner → PgDestination
pub async fn run_pipeline(settings: &Settings) -> Result<RunSummary> {
    let source_url = settings.require_source()?;
    let destination_url = settings.require_destination()?;

    let source = SqlSource::connect(source_url).await?;
    let destination = match PgDestination::connect(destination_url).await {
        Ok(destination) => destination.with_strategy(settings.load_strategy),
        Err(e) => {
            source.close().await;
            return Err(e);
        }
    };

    log::info!(
        "Load strategy: {}, rule set: {:?}",
        settings.load_strategy.cyan(),
        settings.rules.name_policy
    );

    let mut pipeline = Pipeline::new(source, Cleaner::new(settings.rules.clone()), destination)
        .with_empty_table_policy(settings.empty_tables);
    if let Some(allow_list) = &settings.allow_list {
        log::info!("Restricted to {} table(s)", allow_list.len());
        pipeline = pipeline.with_allow_list(allow_list.clone());
    }

    let summary = pipeline.run().await?;
    print_summary(&summary);
    log::info!("ECL process finished");

    Ok(summary)
}

/// List the source tables and whether the allow list admits them
pub async fn list_tables(settings: &Settings) -> Result<Vec<(String, bool)>> {
    let source = SqlSource::connect(settings.require_source()?).await?;
    let listed = source.list_tables().await;
    source.close().await;

    let tables: Vec<(String, bool)> = listed?
        .into_iter()
        .map(|table| {
            let allowed = settings
                .allow_list
                .as_ref()
                .is_none_or(|list| list.contains(&table));
            (table, allowed)
        })
        .collect();

    for (table, allowed) in &tables {
        if *allowed {
            log::info!("  {} {}", "✓".green(), table);
        } else {
            log::info!("  {} {}", "-".bright_black(), table.bright_black());
        }
    }
    log::info!("{} table(s) in the source", tables.len());

    Ok(tables)
}

/// Build the aggregate report tables in the destination
pub async fn build_reports(settings: &Settings, only: &[String]) -> Result<Vec<ReportOutcome>> {
    let selected = reports::select(only)?;
    let destination = PgDestination::connect(settings.require_destination()?).await?;

    let outcomes = reports::build(&destination, &selected).await;
    destination.pool().close().await;

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed == 0 {
        log::info!("✓ Built {} report(s)", outcomes.len());
    } else {
        log::warn!(
            "Built {} of {} report(s), {} failed",
            outcomes.len() - failed,
            outcomes.len(),
            failed.red()
        );
    }

    Ok(outcomes)
}

fn print_summary(summary: &RunSummary) {
    log::info!("Summary:");
    for entry in summary.outcomes() {
        match &entry.outcome {
            RunOutcome::Loaded { .. } => {
                log::info!("  {} {}: {}", "✓".green(), entry.table, entry.outcome)
            }
            outcome if outcome.is_failure() => {
                log::info!("  {} {}: {}", "✗".red(), entry.table, outcome.red())
            }
            outcome => log::info!("  - {}: {}", entry.table, outcome.yellow()),
        }
    }
    log::info!(
        "{} loaded ({} rows), {} skipped, {} failed",
        summary.loaded().green(),
        summary.rows_loaded(),
        summary.skipped().yellow(),
        summary.failed().red()
    );
}
