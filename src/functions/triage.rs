//! Two-call error triage over a window of job error logs.
//!
//! `discover` ranks the jobs that produced errors in the window and stops for
//! a selection. `summarize` is called later with the chosen job id; it reads
//! the window again and re-groups from scratch, since nothing from the
//! discovery call is kept between the two.

use crate::config::ProjectScope;
use crate::errors::{Error, Result};
use crate::functions::correlate::{Correlation, correlate};
use crate::schema::LogEntry;
use crate::services::{Clock, LogStore, Summarizer};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;

pub const DEFAULT_WINDOW_MINUTES: u32 = 60;
pub const MAX_SUMMARY_INPUT_CHARS: usize = 15_000;
pub const LOG_RESOURCE_TYPE: &str = "dataflow_step";
pub const NO_SUMMARY: &str = "No summary generated.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub job_id: String,
    pub error_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscoveryResult {
    /// No error entries in the window at all.
    NoErrors {
        time_window_minutes: u32,
        message: String,
    },
    /// Errors exist but none could be tied to a job.
    Unattributable {
        time_window_minutes: u32,
        entry_count: usize,
        message: String,
    },
    PendingSelection {
        time_window_minutes: u32,
        candidates: Vec<Candidate>,
        unattributed: usize,
        instruction: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    pub job_id: String,
    pub summary: String,
    pub project: String,
    pub log_count: usize,
    pub time_window_minutes: u32,
    pub truncated: bool,
}

pub fn error_filter(now: DateTime<Utc>, window_minutes: u32) -> String {
    let since = now - Duration::minutes(i64::from(window_minutes));
    format!(
        r#"resource.type="{LOG_RESOURCE_TYPE}" severity=ERROR timestamp>="{}""#,
        since.to_rfc3339_opts(SecondsFormat::Micros, true)
    )
}

async fn fetch_window(
    log_store: &dyn LogStore,
    scope: &ProjectScope,
    clock: &dyn Clock,
    window_minutes: u32,
) -> Result<Vec<LogEntry>> {
    // one clock read per call keeps the window fixed for the whole query
    let filter = error_filter(clock.now(), window_minutes);
    log_store
        .query(scope, &filter)
        .await
        .map_err(Error::remote)
}

pub fn rank_candidates(correlation: &Correlation) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = correlation
        .groups
        .iter()
        .map(|g| Candidate {
            job_id: g.job_id.clone(),
            error_count: g.count,
        })
        .collect();
    // stable, so equal counts stay in first-seen order
    candidates.sort_by(|a, b| b.error_count.cmp(&a.error_count));
    candidates
}

pub async fn discover(
    log_store: &dyn LogStore,
    scope: &ProjectScope,
    clock: &dyn Clock,
    window_minutes: u32,
) -> Result<DiscoveryResult> {
    let entries = fetch_window(log_store, scope, clock, window_minutes).await?;
    if entries.is_empty() {
        tracing::info!(window_minutes, "no job errors in window");
        return Ok(DiscoveryResult::NoErrors {
            time_window_minutes: window_minutes,
            message: format!("No job errors found in the last {window_minutes} minutes."),
        });
    }

    let correlation = correlate(&entries);
    if correlation.is_empty() {
        tracing::warn!(
            window_minutes,
            entry_count = entries.len(),
            "error entries present but none carry a job id"
        );
        return Ok(DiscoveryResult::Unattributable {
            time_window_minutes: window_minutes,
            entry_count: entries.len(),
            message: format!(
                "Found {} error entries in the last {window_minutes} minutes, but none could be attributed to a job.",
                entries.len()
            ),
        });
    }

    let candidates = rank_candidates(&correlation);
    tracing::info!(
        window_minutes,
        candidates = candidates.len(),
        unattributed = correlation.unattributed,
        "job errors grouped, awaiting selection"
    );

    Ok(DiscoveryResult::PendingSelection {
        time_window_minutes: window_minutes,
        candidates,
        unattributed: correlation.unattributed,
        instruction: format!(
            "Pick one job id from the candidates and request its summary with the same {window_minutes} minute window."
        ),
    })
}

pub async fn summarize(
    log_store: &dyn LogStore,
    summarizer: &dyn Summarizer,
    scope: &ProjectScope,
    clock: &dyn Clock,
    window_minutes: u32,
    job_id: &str,
) -> Result<SummaryResult> {
    let entries = fetch_window(log_store, scope, clock, window_minutes).await?;
    let correlation = correlate(&entries);
    let group = correlation.get(job_id).ok_or_else(|| Error::UnknownJob {
        job_id: job_id.to_string(),
        window_minutes,
    })?;

    let combined = group
        .entries
        .iter()
        .map(|e| e.payload_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let (logs, truncated) = truncate_chars(&combined, MAX_SUMMARY_INPUT_CHARS);
    if truncated {
        tracing::debug!(job_id, max = MAX_SUMMARY_INPUT_CHARS, "log text truncated");
    }

    let prompt = build_summary_prompt(job_id, window_minutes, logs);
    let generated = summarizer.generate(&prompt).await.map_err(Error::remote)?;
    let summary = if generated.trim().is_empty() {
        tracing::warn!(job_id, "summarizer returned no text");
        NO_SUMMARY.to_string()
    } else {
        generated
    };

    tracing::info!(job_id, log_count = group.count, truncated, "job errors summarized");
    Ok(SummaryResult {
        job_id: job_id.to_string(),
        summary,
        project: scope.project.clone(),
        log_count: group.count,
        time_window_minutes: window_minutes,
        truncated,
    })
}

/// Cuts `text` to at most `max_chars` characters, on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

fn build_summary_prompt(job_id: &str, window_minutes: u32, logs: &str) -> String {
    format!(
        "You are a Google Cloud Dataflow expert.
Analyze the following error logs from job {job_id} and provide a clear, concise summary including:
1. The primary cause of failure.
2. The Dataflow transform or step where it occurred.
3. Possible resolution steps or configuration fixes.
4. Any recurring patterns or warnings worth noting.

Make the explanation short, actionable, and written in plain English.

Logs (last {window_minutes} minutes):
{logs}"
    )
}
