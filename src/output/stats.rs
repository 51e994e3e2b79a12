//! Crawl and store statistics
//!
//! Summaries printed by the CLI after a crawl command, and the per-table
//! overview of the durable store.

use crate::client::CrawlOutcome;
use crate::models::RecordKind;
use crate::storage::{RecordStorage, StorageError, StorageResult, UpsertTally};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Counters of one crawl command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    pub kind: RecordKind,
    pub captured: usize,
    pub skipped: usize,
    pub reused: usize,
    pub degraded: usize,
    pub rows_seen: usize,
    pub rows_filtered: usize,
    pub aborted: bool,
    pub from_store: bool,
    pub categories_skipped: Vec<String>,
    /// Skip diagnostics as `row: reason`
    pub skip_reasons: Vec<String>,
    pub stored: UpsertTally,
}

impl CrawlStatistics {
    pub fn from_outcome<R>(kind: RecordKind, outcome: &CrawlOutcome<R>) -> Self {
        let report = &outcome.report;
        Self {
            kind,
            captured: report.records.len(),
            skipped: report.skipped.len(),
            reused: report.reused,
            degraded: report.degraded,
            rows_seen: report.rows_seen,
            rows_filtered: report.rows_filtered,
            aborted: report.aborted,
            from_store: outcome.from_store,
            categories_skipped: report.categories_skipped.clone(),
            skip_reasons: report
                .skipped
                .iter()
                .map(|s| format!("{}: {}", s.row, s.reason))
                .collect(),
            stored: outcome.stored,
        }
    }

    /// True when rows were loaded but none qualified
    pub fn all_filtered(&self) -> bool {
        self.rows_seen > 0 && self.rows_filtered == self.rows_seen
    }
}

/// Renders crawl statistics as the text printed by the CLI
pub fn format_statistics(stats: &CrawlStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== {} ===", stats.kind);
    if stats.from_store {
        let _ = writeln!(
            out,
            "  {} records from the last completed crawl (use --refresh to crawl again)",
            stats.captured
        );
        return out;
    }

    let _ = writeln!(out, "  Captured: {}", stats.captured);
    let _ = writeln!(out, "  Skipped: {}", stats.skipped);
    if stats.reused > 0 {
        let _ = writeln!(out, "  Reused from store: {}", stats.reused);
    }
    if stats.degraded > 0 {
        let _ = writeln!(out, "  Without detail page: {}", stats.degraded);
    }
    let _ = writeln!(
        out,
        "  Stored: {} new, {} replaced, {} unchanged",
        stats.stored.inserted, stats.stored.replaced, stats.stored.unchanged
    );

    if stats.all_filtered() {
        let _ = writeln!(
            out,
            "  Warning: {} rows were loaded but none matched; the portal layout may have changed",
            stats.rows_seen
        );
    }
    if stats.aborted {
        let _ = writeln!(out, "  Warning: lost the list page; remaining rows were not visited");
    }
    if !stats.categories_skipped.is_empty() {
        let _ = writeln!(out, "  Skipped categories ({}):", stats.categories_skipped.len());
        for category in &stats.categories_skipped {
            let _ = writeln!(out, "    - {}", category);
        }
    }
    if !stats.skip_reasons.is_empty() {
        let _ = writeln!(out, "  Skipped rows:");
        for reason in &stats.skip_reasons {
            let _ = writeln!(out, "    - {}", reason);
        }
    }

    out
}

/// Prints crawl statistics to stdout
pub fn print_statistics(stats: &CrawlStatistics) {
    print!("{}", format_statistics(stats));
}

/// Row count and completion time of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStatistics {
    pub kind: RecordKind,
    pub records: u64,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Loads per-table statistics from the durable store
pub fn load_store_statistics(store: &impl RecordStorage) -> StorageResult<Vec<TableStatistics>> {
    RecordKind::all()
        .into_iter()
        .map(|kind| {
            Ok::<_, StorageError>(TableStatistics {
                kind,
                records: store.count(kind)?,
                completed_at: store.completed_at(kind)?,
            })
        })
        .collect()
}

pub fn print_store_statistics(tables: &[TableStatistics]) {
    println!("=== Stored records ===\n");
    for table in tables {
        match table.completed_at {
            Some(at) => println!(
                "  {:<10} {:>6}  (crawl completed {})",
                table.kind.to_string(),
                table.records,
                at.format("%Y-%m-%d %H:%M")
            ),
            None => println!("  {:<10} {:>6}", table.kind.to_string(), table.records),
        }
    }
}
