// Report Builder - Serializes aggregation results into a downloadable artifact
// One CSV document, three named sections, stable ordering throughout

use crate::aggregate::{common_identities, IdentitySummary};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const COMMON_KEYS_SECTION: &str = "Common Keys";
pub const TRANSACTION_DETAILS_SECTION: &str = "Transaction Details";
pub const FULL_DETAILS_SECTION: &str = "Full Transaction Details";

// ============================================================================
// REPORT MODEL
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<ReportSection>,
}

impl Report {
    /// True when no identity repeated; the artifact is still written,
    /// with headers and empty sections.
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.rows.is_empty())
    }

    /// Serialize all sections into one CSV stream. Sections are
    /// separated by a blank line and introduced by a title row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = WriterBuilder::new().flexible(true).from_writer(writer);

        let generated = self.generated_at.to_rfc3339();
        csv_writer
            .write_record(["Generated", generated.as_str()])
            .context("Failed to write report preamble")?;

        for section in &self.sections {
            csv_writer
                .write_record([""])
                .context("Failed to write section separator")?;
            csv_writer
                .write_record([section.title.as_str()])
                .context("Failed to write section title")?;
            csv_writer
                .write_record(&section.header)
                .context("Failed to write section header")?;
            for row in &section.rows {
                csv_writer
                    .write_record(row)
                    .with_context(|| format!("Failed to write row in {}", section.title))?;
            }
        }

        csv_writer.flush().context("Failed to flush report")?;
        Ok(())
    }

    /// Write the report to a file on disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        self.write_csv(file)
    }

    /// Render the report as an in-memory CSV string
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).context("Report was not valid UTF-8")
    }
}

// ============================================================================
// BUILDING
// ============================================================================

/// Build the three-section report from an aggregation result.
///
/// The common-keys section lists only repeating identities; the two
/// detail sections cover every identity observed, so singleton parties
/// remain inspectable in the artifact.
pub fn build_report(summaries: &BTreeMap<String, IdentitySummary>) -> Report {
    build_report_at(summaries, Utc::now())
}

/// Same as build_report with an explicit timestamp
pub fn build_report_at(
    summaries: &BTreeMap<String, IdentitySummary>,
    generated_at: DateTime<Utc>,
) -> Report {
    let common = ReportSection {
        title: COMMON_KEYS_SECTION.to_string(),
        header: vec!["Common Key".to_string(), "Frequency".to_string()],
        rows: common_identities(summaries)
            .iter()
            .map(|s| vec![s.identity.clone(), s.occurrence_count.to_string()])
            .collect(),
    };

    let details = ReportSection {
        title: TRANSACTION_DETAILS_SECTION.to_string(),
        header: vec![
            "Key".to_string(),
            "Total Transactions".to_string(),
            "Total Amount".to_string(),
            "Methods".to_string(),
        ],
        rows: summaries
            .values()
            .map(|s| {
                vec![
                    s.identity.clone(),
                    s.occurrence_count.to_string(),
                    format!("{:.2}", s.total_amount),
                    s.method_list(),
                ]
            })
            .collect(),
    };

    let full = ReportSection {
        title: FULL_DETAILS_SECTION.to_string(),
        header: vec![
            "Key".to_string(),
            "Method".to_string(),
            "Amount".to_string(),
            "Description".to_string(),
            "Source File".to_string(),
        ],
        rows: summaries
            .values()
            .flat_map(|s| {
                s.records.iter().map(|r| {
                    vec![
                        r.identity.clone(),
                        r.method.map(|m| m.label().to_string()).unwrap_or_default(),
                        format!("{:.2}", r.amount),
                        r.description.clone(),
                        r.source_file.clone(),
                    ]
                })
            })
            .collect(),
    };

    Report {
        generated_at,
        sections: vec![common, details, full],
    }
}

// ============================================================================
// TESTS
// ============================================================================
