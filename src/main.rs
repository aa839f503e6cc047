// Statement Crossref - CLI
// Runs the cross-file analyses over statement CSVs passed on the command line

use anyhow::Result;
use statement_crossref::{
    categorize_rows, compute_totals, filter_by_range, load_inputs, load_table,
    run_frequency_analysis_with, RangeQuery, RangeSide, CATEGORY_RULES,
};
use std::env;
use std::path::{Path, PathBuf};

const REPORT_PATH: &str = "common_names_report.csv";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("common") => run_common(&args[1..]),
        Some("range") => run_range(&args[1..]),
        Some("categorize") => run_categorize(&args[1..]),
        Some("totals") => run_totals(&args[1..]),
        // Bare file arguments default to the common-identity analysis
        Some(_) => run_common(&args),
        None => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("Statement Crossref - cross-file statement analysis");
    println!();
    println!("Usage:");
    println!("  statement-crossref common <files...>");
    println!("  statement-crossref range <credit|debit|both> <min|-> <max|-> <files...>");
    println!("  statement-crossref categorize <cat1,cat2,...> <files...>");
    println!("  statement-crossref totals <files...>");
    println!();
    let categories: Vec<&str> = CATEGORY_RULES.iter().map(|(name, _)| *name).collect();
    println!("Categories: {}", categories.join(", "));
}

fn to_paths(files: &[String]) -> Vec<PathBuf> {
    files.iter().map(PathBuf::from).collect()
}

// ============================================================================
// common
// ============================================================================

fn run_common(files: &[String]) -> Result<()> {
    if files.is_empty() {
        eprintln!("❌ No statement files given");
        print_usage();
        std::process::exit(1);
    }

    println!("🔎 Common-identity analysis across {} file(s)", files.len());

    let (inputs, failures) = load_inputs(&to_paths(files));
    let outcome = run_frequency_analysis_with(&inputs, failures);

    for diag in &outcome.diagnostics {
        println!("✓ {}", diag.summary());
    }
    for warning in outcome.warnings() {
        eprintln!("⚠️  {}", warning);
    }

    println!("\n{}", outcome.message());

    if !outcome.has_data() {
        std::process::exit(1);
    }

    for summary in outcome.summaries.values().filter(|s| s.is_common()) {
        println!(
            "  {} — {} transactions, total {:.2} [{}]",
            summary.identity,
            summary.occurrence_count,
            summary.total_amount,
            summary.method_list()
        );
    }

    let report = outcome.report();
    report.save(Path::new(REPORT_PATH))?;
    println!("\n📄 Report written to {}", REPORT_PATH);

    Ok(())
}

// ============================================================================
// range
// ============================================================================

fn parse_bound(raw: &str) -> Result<Option<f64>> {
    if raw == "-" {
        return Ok(None);
    }
    let value = raw
        .parse::<f64>()
        .map_err(|_| anyhow::anyhow!("invalid amount bound: {}", raw))?;
    Ok(Some(value))
}

fn run_range(args: &[String]) -> Result<()> {
    if args.len() < 4 {
        eprintln!("❌ Usage: range <credit|debit|both> <min|-> <max|-> <files...>");
        std::process::exit(1);
    }

    let side = RangeSide::parse(&args[0])
        .ok_or_else(|| anyhow::anyhow!("invalid side: {} (use credit, debit, or both)", args[0]))?;
    let query = RangeQuery {
        greater_than: parse_bound(&args[1])?,
        less_than: parse_bound(&args[2])?,
        side,
    };
    let files = &args[3..];

    println!("🔎 Range analysis across {} file(s)", files.len());

    for file in files {
        let path = PathBuf::from(file);
        let table = match load_table(&path) {
            Ok(table) => table,
            Err(e) => {
                eprintln!("⚠️  {}", e);
                continue;
            }
        };

        match filter_by_range(&table, file, &query) {
            Ok(rows) => {
                println!("✓ {}: {} of {} rows in range", file, rows.len(), table.row_count())
            }
            Err(e) => eprintln!("⚠️  {}", e),
        }
    }

    Ok(())
}

// ============================================================================
// categorize
// ============================================================================

fn run_categorize(args: &[String]) -> Result<()> {
    if args.len() < 2 {
        eprintln!("❌ Usage: categorize <cat1,cat2,...> <files...>");
        std::process::exit(1);
    }

    let selected: Vec<String> = args[0]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let files = &args[1..];

    println!(
        "🔎 Categorizing {} file(s) into [{}]",
        files.len(),
        selected.join(", ")
    );

    for file in files {
        let path = PathBuf::from(file);
        let table = match load_table(&path) {
            Ok(table) => table,
            Err(e) => {
                eprintln!("⚠️  {}", e);
                continue;
            }
        };

        match categorize_rows(&table, file, &selected) {
            Ok(kept) => {
                println!("✓ {}: {} of {} rows matched", file, kept.len(), table.row_count());
                for category in &selected {
                    let count = kept.iter().filter(|(_, c)| c == category).count();
                    if count > 0 {
                        println!("    {}: {}", category, count);
                    }
                }
            }
            Err(e) => eprintln!("⚠️  {}", e),
        }
    }

    Ok(())
}

// ============================================================================
// totals
// ============================================================================

fn run_totals(files: &[String]) -> Result<()> {
    if files.is_empty() {
        eprintln!("❌ Usage: totals <files...>");
        std::process::exit(1);
    }

    println!("🔎 Totals across {} file(s)", files.len());

    for file in files {
        let path = PathBuf::from(file);
        let table = match load_table(&path) {
            Ok(table) => table,
            Err(e) => {
                eprintln!("⚠️  {}", e);
                continue;
            }
        };

        match compute_totals(&table, file) {
            Ok(totals) => println!(
                "✓ {}: credited {:.2}, debited {:.2}",
                file, totals.total_credit, totals.total_debit
            ),
            Err(e) => eprintln!("⚠️  {}", e),
        }
    }

    Ok(())
}
