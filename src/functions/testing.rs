//! In-memory collaborators for exercising the engine without a network.

use crate::config::ProjectScope;
use crate::schema::{JobIdentity, LogEntry};
use crate::services::{JobPlatform, LaunchRequest, LogStore, PlatformJob, Summarizer};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

pub fn scope() -> ProjectScope {
    ProjectScope {
        project: "test-project".to_string(),
        location: "us-central1".to_string(),
    }
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, hour, minute, 0).unwrap()
}

pub fn platform_job(id: &str, state: i64, created: Option<DateTime<Utc>>) -> PlatformJob {
    PlatformJob {
        id: id.to_string(),
        name: format!("name-{id}"),
        current_state: state,
        create_time: created,
    }
}

#[derive(Default)]
pub struct FakePlatform {
    pub jobs: Vec<PlatformJob>,
    pub failure: Option<String>,
    pub launches: Mutex<Vec<LaunchRequest>>,
    pub list_calls: Mutex<usize>,
}

impl FakePlatform {
    pub fn with_jobs(jobs: Vec<PlatformJob>) -> Self {
        Self {
            jobs,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        match &self.failure {
            Some(msg) => Err(anyhow::anyhow!("{msg}")),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl JobPlatform for FakePlatform {
    async fn launch(
        &self,
        _scope: &ProjectScope,
        request: LaunchRequest,
    ) -> anyhow::Result<JobIdentity> {
        self.check()?;
        let mut launches = self.launches.lock().unwrap();
        let identity = JobIdentity {
            id: format!("2026-10-19_job-{}", launches.len() + 1),
            name: request.job_name.clone(),
        };
        launches.push(request);
        Ok(identity)
    }

    async fn get(&self, _scope: &ProjectScope, job_id: &str) -> anyhow::Result<PlatformJob> {
        self.check()?;
        self.jobs
            .iter()
            .find(|job| job.id == job_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("(8f2a): Job {job_id} not found"))
    }

    async fn list(&self, _scope: &ProjectScope) -> anyhow::Result<Vec<PlatformJob>> {
        *self.list_calls.lock().unwrap() += 1;
        self.check()?;
        Ok(self.jobs.clone())
    }
}

/// Serves one queued batch per query, then repeats the last one.
#[derive(Default)]
pub struct FakeLogStore {
    batches: Mutex<VecDeque<Vec<LogEntry>>>,
    last: Mutex<Vec<LogEntry>>,
    pub filters: Mutex<Vec<String>>,
    pub failure: Option<String>,
}

impl FakeLogStore {
    pub fn with_entries(entries: Vec<LogEntry>) -> Self {
        Self::with_batches(vec![entries])
    }

    pub fn with_batches(batches: Vec<Vec<LogEntry>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl LogStore for FakeLogStore {
    async fn query(&self, _scope: &ProjectScope, filter: &str) -> anyhow::Result<Vec<LogEntry>> {
        self.filters.lock().unwrap().push(filter.to_string());
        if let Some(msg) = &self.failure {
            anyhow::bail!("{msg}");
        }
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.batches.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}

#[derive(Default)]
pub struct FakeSummarizer {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeSummarizer {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl Summarizer for FakeSummarizer {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}
