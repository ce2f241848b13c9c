use crate::schema::{JobErrorGroup, LogEntry};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

pub const JOB_ID_LABEL: &str = "job_id";

// `job id`, `job_id`, `job-id`, `jobid`, optionally quoted, then `:` or `=`.
// The key must start a word so `subjob_id` and `dataflow_job_id` don't match.
static JOB_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bjob[ _-]?id["']?\s*[:=]\s*["']?([\w-]+)"#).expect("valid job id pattern")
});

/// Error entries grouped by job, groups in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    pub groups: Vec<JobErrorGroup>,
    /// Entries dropped because no job id could be resolved.
    pub unattributed: usize,
}

impl Correlation {
    pub fn get(&self, job_id: &str) -> Option<&JobErrorGroup> {
        self.groups.iter().find(|g| g.job_id == job_id)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn attributed(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }
}

/// Job id embedded in the payload text, else the `job_id` resource label.
pub fn extract_job_id(entry: &LogEntry) -> Option<String> {
    JOB_ID_PATTERN
        .captures(&entry.payload_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            entry
                .resource_labels
                .get(JOB_ID_LABEL)
                .filter(|id| !id.is_empty())
                .cloned()
        })
}

pub fn correlate(entries: &[LogEntry]) -> Correlation {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut correlation = Correlation::default();

    for entry in entries {
        let Some(job_id) = extract_job_id(entry) else {
            correlation.unattributed += 1;
            continue;
        };
        let slot = *index.entry(job_id.clone()).or_insert_with(|| {
            correlation.groups.push(JobErrorGroup::new(job_id));
            correlation.groups.len() - 1
        });
        correlation.groups[slot].push(entry.clone());
    }

    if correlation.unattributed > 0 {
        tracing::debug!(
            unattributed = correlation.unattributed,
            groups = correlation.groups.len(),
            "dropped log entries without a job id"
        );
    }
    correlation
}
