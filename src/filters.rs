// Simple Filters - Range, category, and totals passes over raw tables
// Predicate application over already-parsed rows; no identity extraction here

use crate::columns::{ColumnRole, SchemaError};
use crate::table::RawTable;
use serde::{Deserialize, Serialize};

// ============================================================================
// RANGE ANALYSIS
// ============================================================================

/// Which amount column(s) a range query inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeSide {
    Credit,
    Debit,
    Both,
}

impl RangeSide {
    pub fn parse(value: &str) -> Option<RangeSide> {
        match value.to_lowercase().as_str() {
            "credit" => Some(RangeSide::Credit),
            "debit" => Some(RangeSide::Debit),
            "both" => Some(RangeSide::Both),
            _ => None,
        }
    }
}

/// Open or half-open amount window. Bounds are exclusive, matching
/// "strictly greater than / strictly less than" filtering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RangeQuery {
    pub greater_than: Option<f64>,
    pub less_than: Option<f64>,
    pub side: RangeSide,
}

impl RangeQuery {
    fn contains(&self, value: f64) -> bool {
        let lower = self.greater_than.unwrap_or(f64::NEG_INFINITY);
        let upper = self.less_than.unwrap_or(f64::INFINITY);
        value > lower && value < upper
    }
}

/// Row indices whose credit/debit amount falls inside the window.
///
/// Side Both degrades to whichever of the two columns resolves; a table
/// with neither fails with a SchemaError and is skipped.
pub fn filter_by_range(
    table: &RawTable,
    source_file: &str,
    query: &RangeQuery,
) -> Result<Vec<usize>, SchemaError> {
    let credit_col = ColumnRole::Credit.resolve(table.columns());
    let debit_col = ColumnRole::Debit.resolve(table.columns());

    let (credit_col, debit_col) = match query.side {
        RangeSide::Credit => {
            let col = credit_col
                .ok_or_else(|| SchemaError::new(source_file, vec![ColumnRole::Credit]))?;
            (Some(col), None)
        }
        RangeSide::Debit => {
            let col = debit_col
                .ok_or_else(|| SchemaError::new(source_file, vec![ColumnRole::Debit]))?;
            (None, Some(col))
        }
        RangeSide::Both => {
            if credit_col.is_none() && debit_col.is_none() {
                return Err(SchemaError::new(
                    source_file,
                    vec![ColumnRole::Credit, ColumnRole::Debit],
                ));
            }
            (credit_col, debit_col)
        }
    };

    let matches = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            let credit_hit = credit_col
                .and_then(|col| row.get(col))
                .map(|cell| query.contains(cell.to_amount()))
                .unwrap_or(false);
            let debit_hit = debit_col
                .and_then(|col| row.get(col))
                .map(|cell| query.contains(cell.to_amount()))
                .unwrap_or(false);
            credit_hit || debit_hit
        })
        .map(|(i, _)| i)
        .collect();

    Ok(matches)
}

// ============================================================================
// CATEGORIZATION
// ============================================================================

/// Category names with the description keywords that select them,
/// checked in listed order. "Others" catches everything else.
pub const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("UPI", &["upi", "paytm", "google pay", "phonepe"]),
    ("Card", &["card", "debit card", "credit card"]),
    ("Withdrawal", &["atm withdrawal", "cash withdrawal"]),
    ("NEFT", &["neft"]),
    ("IMPS", &["imps"]),
    ("RTGS", &["rtgs"]),
];

pub const FALLBACK_CATEGORY: &str = "Others";

/// Assign a category to one description. Only categories the caller
/// selected participate in matching; everything else falls through.
pub fn assign_category(description: &str, selected: &[String]) -> &'static str {
    let desc = description.to_lowercase();
    for (category, keywords) in CATEGORY_RULES {
        if selected.iter().any(|s| s == category)
            && keywords.iter().any(|kw| desc.contains(kw))
        {
            return category;
        }
    }
    FALLBACK_CATEGORY
}

/// Categorize every row by its description and keep rows whose category
/// was selected. Returns (row index, category) pairs.
pub fn categorize_rows(
    table: &RawTable,
    source_file: &str,
    selected: &[String],
) -> Result<Vec<(usize, &'static str)>, SchemaError> {
    let desc_col = ColumnRole::Description
        .resolve(table.columns())
        .ok_or_else(|| SchemaError::new(source_file, vec![ColumnRole::Description]))?;

    let kept = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let description = row.get(desc_col).map(|c| c.to_text()).unwrap_or_default();
            (i, assign_category(&description, selected))
        })
        .filter(|(_, category)| selected.iter().any(|s| s == category))
        .collect();

    Ok(kept)
}

// ============================================================================
// TOTALS
// ============================================================================

/// Per-file deposit and withdrawal sums
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTotals {
    pub source_file: String,
    pub total_credit: f64,
    pub total_debit: f64,
}

/// Sum the credit and debit columns of one table. A missing column
/// contributes zero; a table with neither fails with a SchemaError.
pub fn compute_totals(table: &RawTable, source_file: &str) -> Result<FileTotals, SchemaError> {
    let credit_col = ColumnRole::Credit.resolve(table.columns());
    let debit_col = ColumnRole::Debit.resolve(table.columns());

    if credit_col.is_none() && debit_col.is_none() {
        return Err(SchemaError::new(
            source_file,
            vec![ColumnRole::Credit, ColumnRole::Debit],
        ));
    }

    let sum_column = |col: Option<&str>| -> f64 {
        col.map(|label| {
            table
                .rows()
                .iter()
                .filter_map(|row| row.get(label))
                .map(|cell| cell.to_amount())
                .sum()
        })
        .unwrap_or(0.0)
    };

    Ok(FileTotals {
        source_file: source_file.to_string(),
        total_credit: sum_column(credit_col),
        total_debit: sum_column(debit_col),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::load_table_from_reader;
    use std::io::Cursor;

    fn table_from(csv: &str) -> RawTable {
        load_table_from_reader(Cursor::new(csv), "test.csv").unwrap()
    }

    fn selected(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_range_filter_credit_side() {
        let table = table_from(
            "Date,Narration,Credit Amt,Debit Amt\n\
             1,one,100,0\n\
             2,two,500,0\n\
             3,three,900,0\n",
        );
        let query = RangeQuery {
            greater_than: Some(200.0),
            less_than: Some(800.0),
            side: RangeSide::Credit,
        };

        let rows = filter_by_range(&table, "t.csv", &query).unwrap();
        assert_eq!(rows, vec![1]);
    }

    #[test]
    fn test_range_bounds_are_exclusive() {
        let table = table_from("Date,Narration,Credit Amt\n1,a,200\n2,b,201\n");
        let query = RangeQuery {
            greater_than: Some(200.0),
            less_than: None,
            side: RangeSide::Credit,
        };

        let rows = filter_by_range(&table, "t.csv", &query).unwrap();
        assert_eq!(rows, vec![1]);
    }

    #[test]
    fn test_range_both_sides_matches_either_column() {
        let table = table_from(
            "Date,Narration,Credit Amt,Debit Amt\n\
             1,a,300,0\n\
             2,b,0,300\n\
             3,c,0,0\n",
        );
        let query = RangeQuery {
            greater_than: Some(100.0),
            less_than: Some(400.0),
            side: RangeSide::Both,
        };

        let rows = filter_by_range(&table, "t.csv", &query).unwrap();
        assert_eq!(rows, vec![0, 1]);
    }

    #[test]
    fn test_range_missing_columns_is_schema_error() {
        let table = table_from("Date,Narration\n1,a\n");
        let query = RangeQuery {
            greater_than: Some(0.0),
            less_than: None,
            side: RangeSide::Both,
        };

        let err = filter_by_range(&table, "t.csv", &query).unwrap_err();
        assert_eq!(err.missing, vec![ColumnRole::Credit, ColumnRole::Debit]);
    }

    #[test]
    fn test_assign_category_respects_selection() {
        let picked = selected(&["NEFT"]);
        // UPI keyword present but UPI not selected
        assert_eq!(assign_category("upi payment via neft", &picked), "NEFT");
        assert_eq!(
            assign_category("upi payment", &picked),
            FALLBACK_CATEGORY
        );
    }

    #[test]
    fn test_categorize_rows_filters_to_selection() {
        let table = table_from(
            "Date,Narration\n\
             1,UPI payment to shop\n\
             2,NEFT salary credit\n\
             3,cheque deposit\n",
        );

        let kept = categorize_rows(&table, "t.csv", &selected(&["UPI", "NEFT"])).unwrap();
        assert_eq!(kept, vec![(0, "UPI"), (1, "NEFT")]);
    }

    #[test]
    fn test_categorize_missing_description_is_schema_error() {
        let table = table_from("Date,Credit Amt\n1,100\n");
        let err = categorize_rows(&table, "t.csv", &selected(&["UPI"])).unwrap_err();
        assert_eq!(err.missing, vec![ColumnRole::Description]);
    }

    #[test]
    fn test_compute_totals() {
        let table = table_from(
            "Date,Narration,Credit Amt,Debit Amt\n\
             1,a,100,40\n\
             2,b,250.5,0\n\
             3,c,not a number,10\n",
        );

        let totals = compute_totals(&table, "t.csv").unwrap();
        assert_eq!(totals.total_credit, 350.5);
        assert_eq!(totals.total_debit, 50.0);
    }

    #[test]
    fn test_compute_totals_without_amount_columns() {
        let table = table_from("Date,Narration\n1,a\n");
        assert!(compute_totals(&table, "t.csv").is_err());
    }
}
