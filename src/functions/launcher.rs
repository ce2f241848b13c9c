use crate::config::ProjectScope;
use crate::errors::{Error, Result};
use crate::schema::{JobIdentity, JobState, JobStatusReport};
use crate::services::{Clock, JobPlatform, LaunchRequest};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Builds job names as `<prefix>-<process start>-<launch time>`.
///
/// The process-start part is fixed for the lifetime of the namer so every job
/// launched by one run shares it; the launch-time suffix keeps repeated
/// launches from colliding.
#[derive(Debug, Clone)]
pub struct JobNamer {
    prefix: String,
}

impl JobNamer {
    pub fn new(prefix: &str, process_start: DateTime<Utc>) -> Self {
        Self {
            prefix: format!("{prefix}-{}", process_start.format("%H%M%S-%Y%m%d")),
        }
    }

    pub fn name_at(&self, now: DateTime<Utc>) -> String {
        format!("{}-{}", self.prefix, now.format("%H%M%S%3f"))
    }
}

/// Launches `template_location` with `parameters` passed through as-is.
pub async fn launch(
    platform: &dyn JobPlatform,
    scope: &ProjectScope,
    namer: &JobNamer,
    clock: &dyn Clock,
    template_location: &str,
    parameters: BTreeMap<String, String>,
) -> Result<JobIdentity> {
    let request = LaunchRequest {
        job_name: namer.name_at(clock.now()),
        template_location: template_location.to_string(),
        parameters,
    };
    let job_name = request.job_name.clone();

    let identity = platform
        .launch(scope, request)
        .await
        .map_err(Error::launch)?;

    tracing::info!(
        job_id = %identity.id,
        job_name = %job_name,
        template = template_location,
        "job launched"
    );
    Ok(identity)
}

pub async fn job_status(
    platform: &dyn JobPlatform,
    scope: &ProjectScope,
    job_id: &str,
) -> Result<JobStatusReport> {
    let job = platform
        .get(scope, job_id)
        .await
        .map_err(Error::remote)?;
    let state = JobState::decode(job.current_state)?;

    Ok(JobStatusReport {
        id: job.id,
        name: job.name,
        state,
    })
}
