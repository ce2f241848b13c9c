use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub payload_text: String,
    #[serde(default)]
    pub resource_labels: HashMap<String, String>,
}

impl LogEntry {
    pub fn new(payload_text: impl Into<String>) -> Self {
        Self {
            payload_text: payload_text.into(),
            resource_labels: HashMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_labels.insert(key.into(), value.into());
        self
    }
}

/// Error entries attributed to one job, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobErrorGroup {
    pub job_id: String,
    pub entries: Vec<LogEntry>,
    pub count: usize,
}

impl JobErrorGroup {
    pub fn new(job_id: String) -> Self {
        Self {
            job_id,
            entries: Vec::new(),
            count: 0,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
        self.count = self.entries.len();
    }
}
