use crate::config::ProjectScope;
use crate::errors::{Error, Result};
use crate::schema::{JobState, JobSummary};
use crate::services::JobPlatform;

pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Most recently created jobs first, at most `limit` of them.
pub async fn list_recent(
    platform: &dyn JobPlatform,
    scope: &ProjectScope,
    limit: i64,
) -> Result<Vec<JobSummary>> {
    let Ok(limit) = usize::try_from(limit) else {
        return Ok(Vec::new());
    };
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut jobs = platform.list(scope).await.map_err(Error::list)?;
    let visible = jobs.len();

    // stable: equal timestamps keep retrieval order; unstamped jobs sort last
    jobs.sort_by(|a, b| b.create_time.cmp(&a.create_time));
    jobs.truncate(limit);

    let summaries = jobs
        .into_iter()
        .map(|job| {
            Ok(JobSummary {
                state: JobState::decode(job.current_state)?,
                id: job.id,
                name: job.name,
                created_at: job.create_time,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(visible, returned = summaries.len(), "listed recent jobs");
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::testing::{FakePlatform, at, platform_job, scope};

    fn ids(jobs: &[JobSummary]) -> Vec<&str> {
        jobs.iter().map(|j| j.id.as_str()).collect()
    }

    #[tokio::test]
    async fn sorts_newest_first_and_truncates() {
        let platform = FakePlatform::with_jobs(vec![
            platform_job("old", 3, Some(at(8, 0))),
            platform_job("newest", 2, Some(at(11, 0))),
            platform_job("middle", 4, Some(at(10, 0))),
        ]);

        let jobs = list_recent(&platform, &scope(), 2).await.unwrap();
        assert_eq!(ids(&jobs), vec!["newest", "middle"]);
        assert_eq!(jobs[0].state, JobState::Running);
        assert_eq!(jobs[1].state, JobState::Failed);
        assert!(jobs.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn ties_keep_retrieval_order() {
        let platform = FakePlatform::with_jobs(vec![
            platform_job("a", 3, Some(at(9, 0))),
            platform_job("b", 3, Some(at(10, 0))),
            platform_job("c", 3, Some(at(9, 0))),
            platform_job("unstamped", 9, None),
        ]);

        let jobs = list_recent(&platform, &scope(), DEFAULT_LIST_LIMIT)
            .await
            .unwrap();
        assert_eq!(ids(&jobs), vec!["b", "a", "c", "unstamped"]);
    }

    #[tokio::test]
    async fn non_positive_limit_returns_nothing() {
        let platform = FakePlatform::with_jobs(vec![platform_job("a", 3, Some(at(9, 0)))]);
        assert!(list_recent(&platform, &scope(), 0).await.unwrap().is_empty());
        assert!(list_recent(&platform, &scope(), -5).await.unwrap().is_empty());
        assert_eq!(*platform.list_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn listing_failure_is_a_list_error() {
        let platform = FakePlatform::failing("Request had invalid authentication credentials.");
        let err = list_recent(&platform, &scope(), 10).await.unwrap_err();
        assert!(matches!(
            err,
            Error::List { cause } if cause == "Request had invalid authentication credentials."
        ));
    }

    #[tokio::test]
    async fn bad_ordinal_in_returned_jobs_fails_the_call() {
        let platform = FakePlatform::with_jobs(vec![platform_job("a", 13, Some(at(9, 0)))]);
        let err = list_recent(&platform, &scope(), 10).await.unwrap_err();
        assert!(matches!(err, Error::OutOfRange { ordinal: 13 }));
    }
}
