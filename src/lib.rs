// Statement Crossref - Core Library
// Exposes all modules for use in the CLI, the upload server, and tests

pub mod aggregate;
pub mod columns;
pub mod extract;
pub mod filters;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod table;

// Re-export commonly used types
pub use aggregate::{
    aggregate, common_identities, CommonalityOutcome, IdentitySummary, COMMON_THRESHOLD,
};
pub use columns::{
    resolve_amount_bearing, resolve_column, ColumnRole, SchemaError, AMOUNT_KEYWORDS,
    CREDIT_KEYWORDS, DEBIT_KEYWORDS, DESCRIPTION_KEYWORDS,
};
pub use extract::{classify_method, extract, TransactionMethod};
pub use filters::{
    assign_category, categorize_rows, compute_totals, filter_by_range, FileTotals, RangeQuery,
    RangeSide, CATEGORY_RULES, FALLBACK_CATEGORY,
};
pub use normalize::{normalize_table, NormalizedRecord, RoleRequirements, TableDiagnostics};
pub use pipeline::{
    load_inputs, run_frequency_analysis, run_frequency_analysis_with, BatchOutcome, TableFailure,
    TableInput,
};
pub use report::{build_report, build_report_at, Report, ReportSection};
pub use table::{load_table, load_table_from_reader, CellValue, LoadError, RawTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
