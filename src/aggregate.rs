// Cross-File Aggregator - Merges normalized records into per-identity summaries
// Pure grouping/reduction; no shared counters survive between calls

use crate::extract::TransactionMethod;
use crate::normalize::NormalizedRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An identity is "common" when it occurs in more than this many records
/// across all processed tables.
pub const COMMON_THRESHOLD: usize = 1;

// ============================================================================
// IDENTITY SUMMARY
// ============================================================================

/// Everything observed about one identity token across the batch.
/// Built during aggregation, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub identity: String,
    pub occurrence_count: usize,
    pub total_amount: f64,
    pub methods_observed: BTreeSet<TransactionMethod>,
    pub records: Vec<NormalizedRecord>,
}

impl IdentitySummary {
    fn new(identity: &str) -> Self {
        IdentitySummary {
            identity: identity.to_string(),
            occurrence_count: 0,
            total_amount: 0.0,
            methods_observed: BTreeSet::new(),
            records: Vec::new(),
        }
    }

    fn push(&mut self, record: NormalizedRecord) {
        self.occurrence_count += 1;
        self.total_amount += record.amount;
        if let Some(method) = record.method {
            self.methods_observed.insert(method);
        }
        self.records.push(record);
    }

    pub fn is_common(&self) -> bool {
        self.occurrence_count > COMMON_THRESHOLD
    }

    /// Method labels joined for display, e.g. "IMPS, NEFT"
    pub fn method_list(&self) -> String {
        self.methods_observed
            .iter()
            .map(|m| m.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Group all records from all tables by identity. Batch order, then row
/// order, fixes the record order within each summary. An empty input
/// yields an empty mapping, the valid "no data" result.
pub fn aggregate(batches: &[Vec<NormalizedRecord>]) -> BTreeMap<String, IdentitySummary> {
    let mut summaries: BTreeMap<String, IdentitySummary> = BTreeMap::new();

    for batch in batches {
        for record in batch {
            summaries
                .entry(record.identity.clone())
                .or_insert_with(|| IdentitySummary::new(&record.identity))
                .push(record.clone());
        }
    }

    summaries
}

/// Identities occurring more than once, in stable (sorted) order
pub fn common_identities(
    summaries: &BTreeMap<String, IdentitySummary>,
) -> Vec<&IdentitySummary> {
    summaries.values().filter(|s| s.is_common()).collect()
}

// ============================================================================
// COMMONALITY OUTCOME
// ============================================================================

/// How many identities repeat across the batch. The boundary uses this
/// to pick its success/info message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommonalityOutcome {
    /// No identity occurs more than once
    None,

    /// Exactly one identity repeats
    Single { identity: String },

    /// Several identities repeat
    Multiple { count: usize },
}

impl CommonalityOutcome {
    pub fn classify(summaries: &BTreeMap<String, IdentitySummary>) -> Self {
        let common = common_identities(summaries);
        match common.len() {
            0 => CommonalityOutcome::None,
            1 => CommonalityOutcome::Single {
                identity: common[0].identity.clone(),
            },
            n => CommonalityOutcome::Multiple { count: n },
        }
    }

    /// User-facing status line
    pub fn message(&self) -> String {
        match self {
            CommonalityOutcome::None => {
                "No common keys found across the uploaded files.".to_string()
            }
            CommonalityOutcome::Single { identity } => {
                format!("A single common key was found across files: {}", identity)
            }
            CommonalityOutcome::Multiple { .. } => {
                "Multiple common keys were found across files.".to_string()
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
