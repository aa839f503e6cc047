// Row Normalizer - Turns one raw table into identity-tagged records
// Column resolution failures skip the table; row failures only skip the row

use crate::columns::{resolve_amount_bearing, ColumnRole, SchemaError};
use crate::extract::{extract, TransactionMethod};
use crate::table::RawTable;
use serde::{Deserialize, Serialize};

// ============================================================================
// NORMALIZED RECORD
// ============================================================================

/// One surviving row, fanned out per extracted identity token.
/// Owned by the aggregator once emitted; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub identity: String,
    pub method: Option<TransactionMethod>,
    pub amount: f64,
    pub description: String,
    pub source_file: String,
}

// ============================================================================
// ROLE REQUIREMENTS
// ============================================================================

/// Which column roles the calling feature needs. The description column
/// is always required; features differ in whether rows must also carry a
/// nonzero amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRequirements {
    /// Require an amount-bearing column, and drop rows whose amount
    /// coerces to zero.
    pub nonzero_amount: bool,
}

impl RoleRequirements {
    /// Frequency / common-identity analysis: description plus an
    /// amount-bearing column.
    pub const FREQUENCY: RoleRequirements = RoleRequirements {
        nonzero_amount: true,
    };

    /// Description-only processing; amounts are carried when a column
    /// resolves but zero amounts do not drop the row.
    pub const DESCRIPTION_ONLY: RoleRequirements = RoleRequirements {
        nonzero_amount: false,
    };
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// Per-table processing counters, for user-facing warnings only.
/// Skipped rows are normal outcomes, not errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableDiagnostics {
    pub source_file: String,
    pub rows_seen: usize,
    pub skipped_no_identity: usize,
    pub skipped_bad_amount: usize,
    pub records_emitted: usize,
}

impl TableDiagnostics {
    pub fn new(source_file: &str) -> Self {
        TableDiagnostics {
            source_file: source_file.to_string(),
            ..Default::default()
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows seen, {} records emitted ({} without identity, {} without valid amount)",
            self.source_file,
            self.rows_seen,
            self.records_emitted,
            self.skipped_no_identity,
            self.skipped_bad_amount
        )
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Normalize one table into records.
///
/// Resolves the description column (required) and, when the requirements
/// ask for it, an amount-bearing column (Amount, else Credit, else
/// Debit). A missing required column fails the whole table with a
/// SchemaError; the caller keeps processing other tables. Rows that
/// yield no identity, or no valid amount where one is required, are
/// counted and dropped. Rows with several identity tokens fan out into
/// one record per token.
pub fn normalize_table(
    table: &RawTable,
    source_file: &str,
    requirements: RoleRequirements,
) -> Result<(Vec<NormalizedRecord>, TableDiagnostics), SchemaError> {
    let desc_col = ColumnRole::Description
        .resolve(table.columns())
        .ok_or_else(|| SchemaError::new(source_file, vec![ColumnRole::Description]))?
        .to_string();

    let amount_col = if requirements.nonzero_amount {
        let (_, label) = resolve_amount_bearing(table.columns())
            .ok_or_else(|| SchemaError::new(source_file, vec![ColumnRole::Amount]))?;
        Some(label.to_string())
    } else {
        resolve_amount_bearing(table.columns()).map(|(_, label)| label.to_string())
    };

    let mut records = Vec::new();
    let mut diagnostics = TableDiagnostics::new(source_file);

    for row in table.rows() {
        diagnostics.rows_seen += 1;

        let narration = row
            .get(&desc_col)
            .map(|cell| cell.to_text())
            .unwrap_or_default();

        let amount = amount_col
            .as_deref()
            .and_then(|col| row.get(col))
            .map(|cell| cell.to_amount())
            .unwrap_or(0.0);

        if requirements.nonzero_amount && (amount.is_nan() || amount == 0.0) {
            diagnostics.skipped_bad_amount += 1;
            continue;
        }

        let (method, identities) = extract(&narration);
        if identities.is_empty() {
            diagnostics.skipped_no_identity += 1;
            continue;
        }

        for identity in identities {
            records.push(NormalizedRecord {
                identity,
                method,
                amount,
                description: narration.clone(),
                source_file: source_file.to_string(),
            });
        }
        diagnostics.records_emitted = records.len();
    }

    Ok((records, diagnostics))
}

// ============================================================================
// TESTS
// ============================================================================
