//! JSON envelope for the summarizer service.

use crate::models::{NewsResponse, SummaryResult};
use chrono::Local;

/// Local time as ISO-8601 with microseconds and no offset.
pub fn local_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Wrap summaries in a successful response stamped with the current time.
pub fn news_response(query_info: impl Into<String>, summaries: Vec<SummaryResult>) -> NewsResponse {
    NewsResponse {
        status: "success".to_string(),
        query_info: query_info.into(),
        summaries,
        timestamp: local_timestamp(),
    }
}
