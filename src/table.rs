// Raw Table Model - Loaded statement tables before any interpretation
// Cells stay as close to the source as possible; coercion happens downstream

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ============================================================================
// CELL VALUE
// ============================================================================

/// A single spreadsheet cell as loaded from the source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// Classify a raw CSV field: numeric-looking fields become Number,
    /// blank fields become Empty, everything else stays Text.
    pub fn from_field(field: &str) -> CellValue {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return CellValue::Number(n);
        }
        CellValue::Text(field.to_string())
    }

    /// Stringify the cell. Numeric and empty cells become their
    /// string form, so narration handling never fails on odd cells.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format!("{}", n),
            CellValue::Empty => String::new(),
        }
    }

    /// Coerce the cell to a numeric amount. Non-numeric and missing
    /// values become 0.0 rather than failing the row. Text amounts are
    /// retried with thousands separators removed ("1,200.50").
    pub fn to_amount(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<f64>()
                    .or_else(|_| trimmed.replace(',', "").parse::<f64>())
                    .unwrap_or(0.0)
            }
            CellValue::Empty => 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

// ============================================================================
// RAW TABLE
// ============================================================================

/// An ordered sequence of rows keyed by case-preserving column label.
/// Immutable once loaded; the normalizer only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<HashMap<String, CellValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        RawTable {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: HashMap<String, CellValue>) {
        self.rows.push(row);
    }

    /// Column labels in table order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[HashMap<String, CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (row, label); None when the row or label is absent
    pub fn cell(&self, row: usize, label: &str) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(label))
    }

    /// Clone out the given rows as a new table with the same columns
    pub fn subset(&self, indices: &[usize]) -> RawTable {
        RawTable {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

// ============================================================================
// LOAD ERROR
// ============================================================================

/// A file the boundary could not parse into a table. Surfaced per-file;
/// never aborts the rest of the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadError {
    pub source_file: String,
    pub reason: String,
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error processing {}: {}", self.source_file, self.reason)
    }
}

impl std::error::Error for LoadError {}

// ============================================================================
// CSV LOADING
// ============================================================================

/// Load a table from a CSV file on disk
pub fn load_table(path: &Path) -> Result<RawTable, LoadError> {
    let label = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.csv")
        .to_string();

    let file = File::open(path).map_err(|e| LoadError {
        source_file: label.clone(),
        reason: format!("failed to open file: {}", e),
    })?;

    load_table_from_reader(file, &label)
}

/// Load a table from any reader (uploaded bytes, an open file, a test
/// string). Header labels are preserved case-sensitively.
pub fn load_table_from_reader<R: Read>(reader: R, label: &str) -> Result<RawTable, LoadError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| LoadError {
            source_file: label.to_string(),
            reason: format!("failed to read header row: {}", e),
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = RawTable::new(headers.clone());

    for (line, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| LoadError {
            source_file: label.to_string(),
            reason: format!("failed to parse line {}: {}", line + 2, e),
        })?;

        let mut row = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let cell = record
                .get(i)
                .map(CellValue::from_field)
                .unwrap_or(CellValue::Empty);
            row.insert(header.clone(), cell);
        }
        table.push_row(row);
    }

    Ok(table)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_cell_from_field_classification() {
        assert_eq!(CellValue::from_field(""), CellValue::Empty);
        assert_eq!(CellValue::from_field("   "), CellValue::Empty);
        assert_eq!(CellValue::from_field("500"), CellValue::Number(500.0));
        assert_eq!(CellValue::from_field(" 12.75 "), CellValue::Number(12.75));
        assert_eq!(
            CellValue::from_field("UPI payment"),
            CellValue::Text("UPI payment".to_string())
        );
    }

    #[test]
    fn test_cell_to_text_is_defensive() {
        assert_eq!(CellValue::Number(9876543210.0).to_text(), "9876543210");
        assert_eq!(CellValue::Empty.to_text(), "");
        assert_eq!(
            CellValue::Text("  NEFT transfer  ".to_string()).to_text(),
            "NEFT transfer"
        );
    }

    #[test]
    fn test_cell_to_amount_coercion() {
        assert_eq!(CellValue::Number(1200.5).to_amount(), 1200.5);
        assert_eq!(CellValue::Text("1,200.50".to_string()).to_amount(), 1200.5);
        assert_eq!(CellValue::Text("not a number".to_string()).to_amount(), 0.0);
        assert_eq!(CellValue::Empty.to_amount(), 0.0);
    }

    #[test]
    fn test_load_table_from_reader() {
        let csv = "Date,Narration,Amount\n\
                   01/04/2025,UPI 9876543210@ybl payment,500\n\
                   02/04/2025,random text,\n";
        let table = load_table_from_reader(Cursor::new(csv), "inline.csv").unwrap();

        assert_eq!(table.columns(), &["Date", "Narration", "Amount"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.cell(0, "Amount"),
            Some(&CellValue::Number(500.0))
        );
        assert_eq!(table.cell(1, "Amount"), Some(&CellValue::Empty));
        assert_eq!(
            table.cell(0, "Narration").unwrap().to_text(),
            "UPI 9876543210@ybl payment"
        );
    }

    #[test]
    fn test_load_table_short_rows_pad_as_empty() {
        let csv = "Date,Narration,Amount\n01/04/2025,only two fields\n";
        let table = load_table_from_reader(Cursor::new(csv), "short.csv").unwrap();

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, "Amount"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_load_table_fixture_file() {
        let table = load_table(Path::new("testdata/statement_a.csv")).unwrap();

        assert_eq!(table.columns(), &["Date", "Narration", "Amount"]);
        assert_eq!(table.row_count(), 4);
    }

    #[test]
    fn test_load_table_missing_file_is_load_error() {
        let err = load_table(Path::new("testdata/does_not_exist.csv")).unwrap_err();
        assert_eq!(err.source_file, "does_not_exist.csv");
        assert!(err.reason.contains("failed to open"));
    }

    #[test]
    fn test_subset_clones_selected_rows() {
        let csv = "A,B\n1,x\n2,y\n3,z\n";
        let table = load_table_from_reader(Cursor::new(csv), "t.csv").unwrap();
        let picked = table.subset(&[0, 2]);

        assert_eq!(picked.row_count(), 2);
        assert_eq!(picked.cell(1, "B").unwrap().to_text(), "z");
    }
}
