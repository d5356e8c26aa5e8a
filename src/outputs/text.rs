//! Plain-text news report.
//!
//! The layout is fixed and carries no clock-dependent data, so formatting
//! the same summaries twice yields byte-identical output.

use crate::error::Result;
use crate::models::SummaryResult;
use crate::utils::ensure_writable_dir;
use chrono::Local;
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

const HEADER: &str = "📰 NEWS SUMMARIES 📰\n\n";

/// Render summaries as the human-readable report.
///
/// `query_info` adds a `Query:` banner when present and non-empty.
pub fn format_results(summaries: &[SummaryResult], query_info: Option<&str>) -> String {
    let mut output = String::from(HEADER);

    if let Some(query) = query_info.filter(|q| !q.is_empty()) {
        let _ = writeln!(output, "Query: {}", query);
        output.push_str(&"=".repeat(50));
        output.push_str("\n\n");
    }

    for (i, summary) in summaries.iter().enumerate() {
        let _ = writeln!(output, "Article {}:", i + 1);
        let _ = writeln!(output, "Title: {}", summary.title);
        let _ = writeln!(output, "Source: {}", summary.source);
        let _ = writeln!(output, "Published: {}", summary.published_date);
        let _ = writeln!(output, "Summary: {}", summary.summary);
        let _ = writeln!(output, "URL: {}", summary.url);
        output.push_str(&"-".repeat(50));
        output.push('\n');
    }

    output
}

/// File name for a report saved now.
pub fn report_file_name() -> String {
    format!("news_summaries_{}.txt", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Write `report` into `dir`, returning the path written.
#[instrument(level = "info", skip(report))]
pub async fn write_report(dir: &str, report: &str) -> Result<String> {
    ensure_writable_dir(dir).await?;
    let path = format!("{}/{}", dir.trim_end_matches('/'), report_file_name());
    fs::write(&path, report).await?;
    info!(%path, bytes = report.len(), "Wrote news report");
    Ok(path)
}
