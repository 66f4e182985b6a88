//! Pipeline orchestration for ECL runs

use super::{
    AllowList, Catalog, EmptyTablePolicy, Extractor, Loader, RunOutcome, RunSummary, Transformer,
    clean_table_name,
};
use crate::table::Table;
use eyre::Result;
use owo_colors::OwoColorize;

/// Pipeline that moves every source table through Extract, Clean and Load
///
/// The source handles both the catalog and the extraction; the loader owns
/// the destination. The pipeline owns both for the duration of [`run`](Self::run)
/// and closes them exactly once when the run ends.
///
/// # Type Parameters
/// - `S`: source store (catalog + extractor of [`Table`]s)
/// - `T`: transformer from [`Table`] to [`Table`]
/// - `L`: loader of [`Table`]s
///
/// # Example
/// ```no_run
/// use pos_ecl::clean::Cleaner;
/// use pos_ecl::etl::{AllowList, Pipeline};
/// use pos_ecl::store::{PgDestination, SqlSource};
///
/// # async fn example() -> eyre::Result<()> {
/// let source = SqlSource::connect("sqlite://pos.db").await?;
/// let destination = PgDestination::connect("postgres://localhost/analytics").await?;
///
/// let summary = Pipeline::new(source, Cleaner::default(), destination)
///     .with_allow_list(AllowList::new(["VENTATICKETS"]))
///     .run()
///     .await?;
///
/// println!("{} table(s) loaded", summary.loaded());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<S, T, L> {
    source: S,
    transformer: T,
    loader: L,
    allow_list: Option<AllowList>,
    empty_tables: EmptyTablePolicy,
}

impl<S, T, L> Pipeline<S, T, L>
where
    S: Catalog + Extractor<Item = Table>,
    T: Transformer<Input = Table, Output = Table>,
    L: Loader<Item = Table>,
{
    /// Create a new pipeline
    pub fn new(source: S, transformer: T, loader: L) -> Self {
        Self {
            source,
            transformer,
            loader,
            allow_list: None,
            empty_tables: EmptyTablePolicy::default(),
        }
    }

    /// Only process the tables in `allow_list`
    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = Some(allow_list);
        self
    }

    /// Choose what happens to empty source tables (default: keep them)
    pub fn with_empty_table_policy(mut self, policy: EmptyTablePolicy) -> Self {
        self.empty_tables = policy;
        self
    }

    /// Run the complete pipeline
    ///
    /// Steps, for every table listed by the source catalog:
    /// 1. Skip it if it is not in the allow list
    /// 2. Extract it, skip it if it is empty
    /// 3. Clean it
    /// 4. Load it into `<table>_clean`
    ///
    /// A failure in one table is recorded in the summary and never stops the
    /// next table.
    ///
    /// # Errors
    /// Returns an error only if the source tables cannot be listed; both
    /// connections are closed before returning.
    pub async fn run(self) -> Result<RunSummary> {
        log::info!("Starting ECL pipeline");

        let tables = match self.source.list_tables().await {
            Ok(tables) => tables,
            Err(e) => {
                self.close().await;
                return Err(e.wrap_err("Failed to list source tables"));
            }
        };
        log::info!("Found {} table(s) in the source", tables.len());

        let mut summary = RunSummary::default();
        for table in tables {
            let outcome = self.process(&table).await;
            report(&table, &outcome);
            summary.push(table, outcome);
        }

        self.close().await;

        log::info!(
            "ECL run complete: {} loaded, {} skipped, {} failed",
            summary.loaded(),
            summary.skipped(),
            summary.failed()
        );

        Ok(summary)
    }

    async fn process(&self, table: &str) -> RunOutcome {
        if let Some(allow_list) = &self.allow_list
            && !allow_list.contains(table)
        {
            return RunOutcome::SkippedNotAllowed;
        }

        log::info!("Processing table: {}", table.cyan());

        let data = match self.source.extract(table).await {
            Ok(data) => data,
            Err(e) => return RunOutcome::ReadFailed(format!("{e:#}")),
        };

        if data.is_empty() {
            if self.empty_tables == EmptyTablePolicy::DropSource {
                self.drop_empty(table).await;
            }
            return RunOutcome::SkippedEmpty;
        }

        let rows_before = data.row_count();
        log::info!("{} row(s) read from {}", rows_before, table);

        let cleaned = match self.transformer.transform(data) {
            Ok(cleaned) => cleaned,
            Err(e) => return RunOutcome::LoadFailed(format!("cleaning failed: {e:#}")),
        };
        let rows_after = cleaned.row_count();
        log::info!("{} row(s) after cleaning", rows_after);

        let destination = clean_table_name(table);
        match self.loader.load(&destination, cleaned).await {
            Ok(_) => RunOutcome::Loaded {
                rows_before,
                rows_after,
            },
            Err(e) => RunOutcome::LoadFailed(format!("{e:#}")),
        }
    }

    async fn drop_empty(&self, table: &str) {
        log::info!("Dropping empty table {} from the source", table);
        match self.source.drop_table(table).await {
            Ok(()) => log::info!("✓ Dropped {}", table),
            Err(e) => log::warn!("Could not drop {}: {:#}", table, e),
        }
    }

    async fn close(&self) {
        self.source.close().await;
        self.loader.close().await;
    }
}

/// Status line for one table
fn report(table: &str, outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Loaded {
            rows_before,
            rows_after,
        } => log::info!(
            "{} {}: {} row(s) read, {} loaded into {}",
            "✓".green(),
            table,
            rows_before,
            rows_after,
            clean_table_name(table).bright_black()
        ),
        RunOutcome::SkippedEmpty => log::warn!("{} is empty, skipped", table.yellow()),
        RunOutcome::SkippedNotAllowed => {
            log::debug!("{} is not in the allow list, skipped", table)
        }
        RunOutcome::ReadFailed(reason) => {
            log::error!("{} Could not read {}: {}", "✗".red(), table, reason)
        }
        RunOutcome::LoadFailed(reason) => log::error!(
            "{} Failed to load {}: {}",
            "✗".red(),
            clean_table_name(table),
            reason
        ),
    }
}
