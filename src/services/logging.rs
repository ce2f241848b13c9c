use crate::config::ProjectScope;
use crate::schema::LogEntry;
use crate::services::http::{build_client, continuation, read_json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const MAX_PAGE_SIZE: usize = 1000;

#[async_trait::async_trait]
pub trait LogStore: Send + Sync {
    async fn query(&self, scope: &ProjectScope, filter: &str) -> anyhow::Result<Vec<LogEntry>>;
}

pub struct CloudLoggingClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    max_entries: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesRequest<'a> {
    resource_names: Vec<String>,
    filter: &'a str,
    order_by: &'a str,
    page_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesResponse {
    #[serde(default)]
    entries: Vec<WireEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEntry {
    #[serde(default)]
    text_payload: Option<String>,
    #[serde(default)]
    json_payload: Option<serde_json::Value>,
    #[serde(default)]
    proto_payload: Option<serde_json::Value>,
    #[serde(default)]
    resource: Option<WireResource>,
}

#[derive(Deserialize)]
struct WireResource {
    #[serde(default)]
    labels: HashMap<String, String>,
}

impl From<WireEntry> for LogEntry {
    fn from(entry: WireEntry) -> Self {
        let payload_text = entry
            .text_payload
            .or_else(|| entry.json_payload.map(|v| v.to_string()))
            .or_else(|| entry.proto_payload.map(|v| v.to_string()))
            .unwrap_or_default();
        LogEntry {
            payload_text,
            resource_labels: entry.resource.map(|r| r.labels).unwrap_or_default(),
        }
    }
}

impl CloudLoggingClient {
    pub fn new(endpoint: String, access_token: String, max_entries: usize) -> anyhow::Result<Self> {
        if max_entries == 0 {
            anyhow::bail!("log entry limit must be at least 1");
        }
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
            max_entries,
        })
    }
}

#[async_trait::async_trait]
impl LogStore for CloudLoggingClient {
    async fn query(&self, scope: &ProjectScope, filter: &str) -> anyhow::Result<Vec<LogEntry>> {
        let url = format!("{}/v2/entries:list", self.endpoint);
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        while let Some(page_size) = next_page_size(self.max_entries, entries.len()) {
            let request = ListEntriesRequest {
                resource_names: vec![format!("projects/{}", scope.project)],
                filter,
                order_by: "timestamp asc",
                page_size,
                page_token: page_token.as_deref(),
            };

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.access_token)
                .json(&request)
                .send()
                .await?;
            let page: ListEntriesResponse = read_json(response, "logging").await?;
            entries.extend(page.entries.into_iter().map(LogEntry::from));

            match continuation(page.next_page_token) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        if entries.len() > self.max_entries {
            tracing::debug!(
                fetched = entries.len(),
                max = self.max_entries,
                "log window exceeds entry limit, truncating"
            );
            entries.truncate(self.max_entries);
        }

        tracing::debug!(count = entries.len(), filter, "fetched log entries");
        Ok(entries)
    }
}

/// Size of the next page to request, or `None` once `fetched` reached the ceiling.
fn next_page_size(max_entries: usize, fetched: usize) -> Option<usize> {
    let remaining = max_entries.saturating_sub(fetched);
    (remaining > 0).then(|| remaining.min(MAX_PAGE_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_below_one_page_asks_for_exactly_the_ceiling() {
        assert_eq!(next_page_size(50, 0), Some(50));
        assert_eq!(next_page_size(50, 50), None);
    }

    #[test]
    fn ceiling_spanning_pages_counts_down() {
        assert_eq!(next_page_size(2500, 0), Some(MAX_PAGE_SIZE));
        assert_eq!(next_page_size(2500, 1000), Some(MAX_PAGE_SIZE));
        assert_eq!(next_page_size(2500, 2000), Some(500));
        assert_eq!(next_page_size(2500, 2500), None);
        // a server that over-delivers still stops the loop
        assert_eq!(next_page_size(2500, 2600), None);
    }

    #[test]
    fn zero_entry_limit_is_rejected() {
        let err = CloudLoggingClient::new("http://127.0.0.1:1".to_string(), "t".to_string(), 0)
            .err()
            .unwrap();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn prefers_text_payload() {
        let entry: WireEntry = serde_json::from_str(
            r#"{
                "textPayload": "Error in step s3",
                "resource": {"type": "dataflow_step", "labels": {"job_id": "2026-10-19_01", "step_id": "s3"}}
            }"#,
        )
        .unwrap();
        let entry = LogEntry::from(entry);
        assert_eq!(entry.payload_text, "Error in step s3");
        assert_eq!(
            entry.resource_labels.get("job_id").map(String::as_str),
            Some("2026-10-19_01")
        );
    }

    #[test]
    fn serializes_json_payload_whole() {
        let entry: WireEntry = serde_json::from_str(
            r#"{"jsonPayload": {"message": "boom", "job_id": "abc-1"}}"#,
        )
        .unwrap();
        let entry = LogEntry::from(entry);
        assert!(entry.payload_text.contains("\"job_id\":\"abc-1\""));
        assert!(entry.payload_text.contains("boom"));
        assert!(entry.resource_labels.is_empty());
    }

    #[test]
    fn request_body_uses_api_field_names() {
        let request = ListEntriesRequest {
            resource_names: vec!["projects/p".to_string()],
            filter: "severity=ERROR",
            order_by: "timestamp asc",
            page_size: 50,
            page_token: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["resourceNames"][0], "projects/p");
        assert_eq!(json["orderBy"], "timestamp asc");
        assert_eq!(json["pageSize"], 50);
        assert!(json.get("pageToken").is_none());
    }
}
