// Batch Pipeline - End-to-end frequency analysis over uploaded tables
// Per-table failures are collected as values; one bad file never kills a batch

use crate::aggregate::{aggregate, CommonalityOutcome, IdentitySummary};
use crate::columns::SchemaError;
use crate::normalize::{normalize_table, RoleRequirements, TableDiagnostics};
use crate::report::{build_report, Report};
use crate::table::{load_table, LoadError, RawTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// INPUTS AND FAILURES
// ============================================================================

/// One loaded table with its originating file label
#[derive(Debug, Clone)]
pub struct TableInput {
    pub table: RawTable,
    pub source_file: String,
}

/// Why one table dropped out of the batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TableFailure {
    Load(LoadError),
    Schema(SchemaError),
}

impl TableFailure {
    pub fn source_file(&self) -> &str {
        match self {
            TableFailure::Load(e) => &e.source_file,
            TableFailure::Schema(e) => &e.source_file,
        }
    }
}

impl std::fmt::Display for TableFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableFailure::Load(e) => e.fmt(f),
            TableFailure::Schema(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for TableFailure {}

// ============================================================================
// BATCH OUTCOME
// ============================================================================

/// Everything the boundary needs to render a frequency-analysis result:
/// summaries keyed by identity, the commonality classification, per-table
/// diagnostics, and the tables that fell out along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub summaries: BTreeMap<String, IdentitySummary>,
    pub commonality: CommonalityOutcome,
    pub diagnostics: Vec<TableDiagnostics>,
    pub failures: Vec<TableFailure>,
    pub tables_processed: usize,
}

impl BatchOutcome {
    /// False when no table survived loading and column resolution; the
    /// terminal "no valid data" outcome for the whole request.
    pub fn has_data(&self) -> bool {
        self.tables_processed > 0
    }

    /// User-facing status line for the batch
    pub fn message(&self) -> String {
        if !self.has_data() {
            "No valid data found in the uploaded files.".to_string()
        } else {
            self.commonality.message()
        }
    }

    /// Warning lines for files that were skipped
    pub fn warnings(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.to_string()).collect()
    }

    /// Build the downloadable report for this outcome
    pub fn report(&self) -> Report {
        build_report(&self.summaries)
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Run the frequency analysis over a batch of loaded tables.
///
/// Tables are normalized independently, in input order; each produces
/// either a record batch with diagnostics or a schema failure. The
/// surviving batches feed one aggregation pass.
pub fn run_frequency_analysis(inputs: &[TableInput]) -> BatchOutcome {
    run_frequency_analysis_with(inputs, Vec::new())
}

/// Same as run_frequency_analysis, seeded with failures the boundary
/// already collected while loading files.
pub fn run_frequency_analysis_with(
    inputs: &[TableInput],
    mut failures: Vec<TableFailure>,
) -> BatchOutcome {
    let mut batches = Vec::new();
    let mut diagnostics = Vec::new();

    for input in inputs {
        match normalize_table(&input.table, &input.source_file, RoleRequirements::FREQUENCY) {
            Ok((records, diag)) => {
                diagnostics.push(diag);
                batches.push(records);
            }
            Err(schema_error) => failures.push(TableFailure::Schema(schema_error)),
        }
    }

    let tables_processed = batches.len();
    let summaries = aggregate(&batches);
    let commonality = CommonalityOutcome::classify(&summaries);

    BatchOutcome {
        summaries,
        commonality,
        diagnostics,
        failures,
        tables_processed,
    }
}

/// Load a batch of CSV files, collecting per-file load failures instead
/// of aborting on the first bad one.
pub fn load_inputs(paths: &[impl AsRef<Path>]) -> (Vec<TableInput>, Vec<TableFailure>) {
    let mut inputs = Vec::new();
    let mut failures = Vec::new();

    for path in paths {
        let path = path.as_ref();
        match load_table(path) {
            Ok(table) => {
                let source_file = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown.csv")
                    .to_string();
                inputs.push(TableInput { table, source_file });
            }
            Err(load_error) => failures.push(TableFailure::Load(load_error)),
        }
    }

    (inputs, failures)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CommonalityOutcome;
    use crate::extract::TransactionMethod;
    use crate::table::load_table_from_reader;
    use std::collections::BTreeSet;
    use std::io::Cursor;

    fn input(csv: &str, label: &str) -> TableInput {
        TableInput {
            table: load_table_from_reader(Cursor::new(csv), label).unwrap(),
            source_file: label.to_string(),
        }
    }

    #[test]
    fn test_cross_file_common_identity() {
        let a = input(
            "Date,Narration,Amount\n01/04/2025,IMPS-Ramesh Kumar-AB12345678Z,500\n",
            "a.csv",
        );
        let b = input(
            "Txn Date,Transaction Details,Deposit Amt\n02/04/2025,NEFT-Ramesh Kumar-AB12345678Z,1200\n",
            "b.csv",
        );

        let outcome = run_frequency_analysis(&[a, b]);

        assert_eq!(outcome.tables_processed, 2);
        let summary = &outcome.summaries["Ramesh Kumar"];
        assert_eq!(summary.occurrence_count, 2);
        assert_eq!(summary.total_amount, 1700.0);
        assert_eq!(
            summary.methods_observed,
            BTreeSet::from([TransactionMethod::Imps, TransactionMethod::Neft])
        );
        assert_eq!(
            outcome.commonality,
            CommonalityOutcome::Single {
                identity: "Ramesh Kumar".to_string()
            }
        );
    }

    #[test]
    fn test_schema_failure_skips_table_not_batch() {
        let bad = input("Date,Amount\n01/04/2025,100\n", "bad.csv");
        let good = input(
            "Date,Narration,Amount\n01/04/2025,UPI 9876543210@ybl,500\n",
            "good.csv",
        );

        let outcome = run_frequency_analysis(&[bad, good]);

        assert_eq!(outcome.tables_processed, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].source_file(), "bad.csv");
        assert!(outcome.summaries.contains_key("9876543210@ybl"));
    }

    #[test]
    fn test_no_identities_is_valid_empty_outcome() {
        let table = input(
            "Date,Narration,Amount\n01/04/2025,random text no identifiers,100\n",
            "a.csv",
        );

        let outcome = run_frequency_analysis(&[table]);

        assert!(outcome.has_data());
        assert!(outcome.summaries.is_empty());
        assert_eq!(outcome.commonality, CommonalityOutcome::None);
        assert_eq!(
            outcome.message(),
            "No common keys found across the uploaded files."
        );
        assert!(outcome.report().is_empty());
    }

    #[test]
    fn test_all_tables_failing_is_no_valid_data() {
        let bad_a = input("Date,Amount\n1,100\n", "a.csv");
        let bad_b = input("Date,Value\n1,100\n", "b.csv");

        let outcome = run_frequency_analysis(&[bad_a, bad_b]);

        assert!(!outcome.has_data());
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.message(), "No valid data found in the uploaded files.");
    }

    #[test]
    fn test_diagnostics_per_table() {
        let table = input(
            "Date,Narration,Amount\n\
             1,UPI 9876543210@ybl,500\n\
             2,no identifiers here,100\n\
             3,UPI 9876543210@ybl,0\n",
            "a.csv",
        );

        let outcome = run_frequency_analysis(&[table]);
        let diag = &outcome.diagnostics[0];

        assert_eq!(diag.rows_seen, 3);
        assert_eq!(diag.skipped_no_identity, 1);
        assert_eq!(diag.skipped_bad_amount, 1);
        assert_eq!(diag.records_emitted, 1);
    }

    #[test]
    fn test_load_inputs_collects_failures() {
        let (inputs, failures) = load_inputs(&[
            Path::new("testdata/statement_a.csv"),
            Path::new("testdata/missing.csv"),
        ]);

        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].source_file, "statement_a.csv");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].source_file(), "missing.csv");
    }

    #[test]
    fn test_fixture_end_to_end() {
        let (inputs, failures) = load_inputs(&[
            Path::new("testdata/statement_a.csv"),
            Path::new("testdata/statement_b.csv"),
        ]);
        assert!(failures.is_empty());

        let outcome = run_frequency_analysis(&inputs);

        assert_eq!(outcome.tables_processed, 2);
        assert!(outcome.summaries["Ramesh Kumar"].is_common());
        let report = outcome.report();
        assert!(!report.is_empty());
    }
}
