//! Per-table results of a pipeline run

use std::fmt;

/// What happened to one source table during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Cleaned and loaded; row counts before and after cleaning
    Loaded {
        rows_before: usize,
        rows_after: usize,
    },
    /// The source table had no rows, nothing was loaded
    SkippedEmpty,
    /// The table is not in the allow list and was never read
    SkippedNotAllowed,
    ReadFailed(String),
    LoadFailed(String),
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::ReadFailed(_) | RunOutcome::LoadFailed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RunOutcome::SkippedEmpty | RunOutcome::SkippedNotAllowed)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Loaded {
                rows_before,
                rows_after,
            } => write!(f, "loaded ({} → {} rows)", rows_before, rows_after),
            RunOutcome::SkippedEmpty => write!(f, "skipped (empty)"),
            RunOutcome::SkippedNotAllowed => write!(f, "skipped (not allowed)"),
            RunOutcome::ReadFailed(reason) => write!(f, "read failed: {}", reason),
            RunOutcome::LoadFailed(reason) => write!(f, "load failed: {}", reason),
        }
    }
}

/// Outcome of one named table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutcome {
    pub table: String,
    pub outcome: RunOutcome,
}

/// Ordered outcomes of a whole run, one per discovered table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    outcomes: Vec<TableOutcome>,
}

impl RunSummary {
    pub fn push(&mut self, table: impl Into<String>, outcome: RunOutcome) {
        self.outcomes.push(TableOutcome {
            table: table.into(),
            outcome,
        });
    }

    pub fn outcomes(&self) -> &[TableOutcome] {
        &self.outcomes
    }

    /// Outcome recorded for a table, if it was discovered
    pub fn get(&self, table: &str) -> Option<&RunOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.table == table)
            .map(|o| &o.outcome)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn loaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, RunOutcome::Loaded { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_failure()).count()
    }

    /// Total rows loaded across all tables
    pub fn rows_loaded(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.outcome {
                RunOutcome::Loaded { rows_after, .. } => rows_after,
                _ => 0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        summary.push(
            "A",
            RunOutcome::Loaded {
                rows_before: 10,
                rows_after: 8,
            },
        );
        summary.push("B", RunOutcome::SkippedEmpty);
        summary.push("C", RunOutcome::SkippedNotAllowed);
        summary.push("D", RunOutcome::LoadFailed("boom".to_string()));

        assert_eq!(summary.len(), 4);
        assert_eq!(summary.loaded(), 1);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.rows_loaded(), 8);
        assert_eq!(summary.get("B"), Some(&RunOutcome::SkippedEmpty));
        assert_eq!(summary.get("Z"), None);
    }

    #[test]
    fn test_outcome_display() {
        let outcome = RunOutcome::ReadFailed("permission denied".to_string());
        assert_eq!(outcome.to_string(), "read failed: permission denied");
    }
}
