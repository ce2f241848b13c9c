use crate::config::ProjectScope;
use crate::schema::{JobIdentity, JobState};
use crate::services::http::{build_client, continuation, read_json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
// Asks the API to send enums as their ordinals instead of names.
const ENUM_AS_INT: (&str, &str) = ("$alt", "json;enum-encoding=int");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub job_name: String,
    pub template_location: String,
    pub parameters: BTreeMap<String, String>,
}

/// A job as the platform reports it, before its state ordinal is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformJob {
    pub id: String,
    pub name: String,
    pub current_state: i64,
    pub create_time: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
pub trait JobPlatform: Send + Sync {
    async fn launch(
        &self,
        scope: &ProjectScope,
        request: LaunchRequest,
    ) -> anyhow::Result<JobIdentity>;
    async fn get(&self, scope: &ProjectScope, job_id: &str) -> anyhow::Result<PlatformJob>;
    async fn list(&self, scope: &ProjectScope) -> anyhow::Result<Vec<PlatformJob>>;
}

pub struct DataflowClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LaunchFlexTemplateBody<'a> {
    launch_parameter: LaunchParameter<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LaunchParameter<'a> {
    job_name: &'a str,
    container_spec_gcs_path: &'a str,
    parameters: &'a BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct LaunchFlexTemplateResponse {
    job: Option<WireJob>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListJobsResponse {
    #[serde(default)]
    jobs: Vec<WireJob>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireJob {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    current_state: WireState,
    #[serde(default)]
    create_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireState {
    Ordinal(i64),
    Name(String),
}

impl Default for WireState {
    fn default() -> Self {
        WireState::Ordinal(0)
    }
}

impl WireState {
    /// Names are only sent when the API ignores the int encoding; unrecognised
    /// names map to -1 so decoding rejects them.
    fn ordinal(&self) -> i64 {
        match self {
            WireState::Ordinal(ordinal) => *ordinal,
            WireState::Name(name) => match JobState::ALL.iter().find(|s| s.wire_name() == *name) {
                Some(state) => state.ordinal(),
                None => {
                    tracing::warn!(state = %name, "unrecognised job state name");
                    -1
                }
            },
        }
    }
}

impl From<WireJob> for PlatformJob {
    fn from(job: WireJob) -> Self {
        Self {
            current_state: job.current_state.ordinal(),
            id: job.id,
            name: job.name,
            create_time: job.create_time,
        }
    }
}

impl DataflowClient {
    pub fn new(endpoint: String, access_token: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn scope_url(&self, scope: &ProjectScope) -> String {
        format!(
            "{}/v1b3/projects/{}/locations/{}",
            self.endpoint, scope.project, scope.location
        )
    }
}

#[async_trait::async_trait]
impl JobPlatform for DataflowClient {
    async fn launch(
        &self,
        scope: &ProjectScope,
        request: LaunchRequest,
    ) -> anyhow::Result<JobIdentity> {
        let body = LaunchFlexTemplateBody {
            launch_parameter: LaunchParameter {
                job_name: &request.job_name,
                container_spec_gcs_path: &request.template_location,
                parameters: &request.parameters,
            },
        };
        tracing::debug!(
            job_name = %request.job_name,
            template = %request.template_location,
            parameter_count = request.parameters.len(),
            "launching flex template"
        );

        let response = self
            .client
            .post(format!("{}/flexTemplates:launch", self.scope_url(scope)))
            .bearer_auth(&self.access_token)
            .query(&[ENUM_AS_INT])
            .json(&body)
            .send()
            .await?;

        let launched: LaunchFlexTemplateResponse = read_json(response, "dataflow").await?;
        let job = launched
            .job
            .ok_or_else(|| anyhow::anyhow!("launch response did not include a job"))?;

        Ok(JobIdentity {
            id: job.id,
            name: job.name,
        })
    }

    async fn get(&self, scope: &ProjectScope, job_id: &str) -> anyhow::Result<PlatformJob> {
        let response = self
            .client
            .get(format!("{}/jobs/{job_id}", self.scope_url(scope)))
            .bearer_auth(&self.access_token)
            .query(&[ENUM_AS_INT, ("view", "JOB_VIEW_SUMMARY")])
            .send()
            .await?;

        let job: WireJob = read_json(response, "dataflow").await?;
        Ok(job.into())
    }

    async fn list(&self, scope: &ProjectScope) -> anyhow::Result<Vec<PlatformJob>> {
        let url = format!("{}/jobs", self.scope_url(scope));
        let mut jobs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&[ENUM_AS_INT]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ListJobsResponse = read_json(request.send().await?, "dataflow").await?;
            jobs.extend(page.jobs.into_iter().map(PlatformJob::from));

            match continuation(page.next_page_token) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = jobs.len(), "listed dataflow jobs");
        Ok(jobs)
    }
}
