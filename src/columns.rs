// Column Resolver - Maps semantic roles onto arbitrary statement layouts
// First column whose label contains a role keyword wins; scan order is table order

use serde::{Deserialize, Serialize};

// ============================================================================
// ROLE KEYWORDS (fixed configuration, not inline literals)
// ============================================================================

pub const DESCRIPTION_KEYWORDS: &[&str] = &[
    "description",
    "txn_desc",
    "narration",
    "particulars",
    "transaction details",
    "remarks",
];

pub const CREDIT_KEYWORDS: &[&str] = &["credit", "deposit", "cr", "credit amount"];

pub const DEBIT_KEYWORDS: &[&str] = &["debit", "withdrawal", "dr", "debit amount"];

pub const AMOUNT_KEYWORDS: &[&str] = &["amount", "transaction amount", "transaction_amount"];

// ============================================================================
// COLUMN ROLE
// ============================================================================

/// Semantic purpose a statement column can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Description,
    Credit,
    Debit,
    Amount,
}

impl ColumnRole {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            ColumnRole::Description => "Description",
            ColumnRole::Credit => "Credit",
            ColumnRole::Debit => "Debit",
            ColumnRole::Amount => "Amount",
        }
    }

    /// Keyword set this role matches against
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Description => DESCRIPTION_KEYWORDS,
            ColumnRole::Credit => CREDIT_KEYWORDS,
            ColumnRole::Debit => DEBIT_KEYWORDS,
            ColumnRole::Amount => AMOUNT_KEYWORDS,
        }
    }

    /// Resolve this role against a table's column labels
    pub fn resolve<'a>(&self, labels: &'a [String]) -> Option<&'a str> {
        resolve_column(labels, self.keywords())
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Find the first column whose label contains (case-insensitive) any of
/// the given keywords. Returns None when nothing matches. Pure function:
/// the same labels and keywords always resolve to the same column.
pub fn resolve_column<'a>(labels: &'a [String], keywords: &[&str]) -> Option<&'a str> {
    labels
        .iter()
        .find(|label| {
            let lower = label.to_lowercase();
            keywords.iter().any(|kw| lower.contains(kw))
        })
        .map(|label| label.as_str())
}

/// Resolve whichever amount-bearing column a table offers, trying the
/// Amount role first, then Credit, then Debit.
pub fn resolve_amount_bearing(labels: &[String]) -> Option<(ColumnRole, &str)> {
    for role in [ColumnRole::Amount, ColumnRole::Credit, ColumnRole::Debit] {
        if let Some(label) = role.resolve(labels) {
            return Some((role, label));
        }
    }
    None
}

// ============================================================================
// SCHEMA ERROR
// ============================================================================

/// A required column role could not be resolved in a table. The whole
/// table is skipped; the batch continues with the remaining files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaError {
    pub source_file: String,
    pub missing: Vec<ColumnRole>,
}

impl SchemaError {
    pub fn new(source_file: &str, missing: Vec<ColumnRole>) -> Self {
        SchemaError {
            source_file: source_file.to_string(),
            missing,
        }
    }
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let roles: Vec<&str> = self.missing.iter().map(|r| r.name()).collect();
        write!(
            f,
            "No {} column found in {}",
            roles.join(" or "),
            self.source_file
        )
    }
}

impl std::error::Error for SchemaError {}

// ============================================================================
// TESTS
// ============================================================================
