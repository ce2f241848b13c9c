use crate::errors::{Error, Result};
use serde::Serialize;

const DEFAULT_DATAFLOW_ENDPOINT: &str = "https://dataflow.googleapis.com";
const DEFAULT_LOGGING_ENDPOINT: &str = "https://logging.googleapis.com";
const DEFAULT_SUMMARY_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_SUMMARY_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_JOB_PREFIX: &str = "adk-job";
const DEFAULT_MAX_LOG_ENTRIES: usize = 1000;

/// Project and region every remote call is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectScope {
    pub project: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub scope: ProjectScope,
    pub access_token: String,
    pub api_key: Option<String>,
    pub summary_model: String,
    pub job_prefix: String,
    pub max_log_entries: usize,
    pub dataflow_endpoint: String,
    pub logging_endpoint: String,
    pub summary_endpoint: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{key} not set")))
        };
        let optional = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let max_log_entries = match lookup("FLOWWATCH_MAX_LOG_ENTRIES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                Error::Config(format!("FLOWWATCH_MAX_LOG_ENTRIES is not a number: {e}"))
            })?,
            None => DEFAULT_MAX_LOG_ENTRIES,
        };
        if max_log_entries == 0 {
            return Err(Error::Config(
                "FLOWWATCH_MAX_LOG_ENTRIES must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            scope: ProjectScope {
                project: required("GOOGLE_CLOUD_PROJECT")?,
                location: required("GOOGLE_CLOUD_LOCATION")?,
            },
            access_token: required("GOOGLE_OAUTH_ACCESS_TOKEN")?,
            api_key: lookup("GOOGLE_API_KEY").filter(|v| !v.trim().is_empty()),
            summary_model: optional("FLOWWATCH_SUMMARY_MODEL", DEFAULT_SUMMARY_MODEL),
            job_prefix: optional("FLOWWATCH_JOB_PREFIX", DEFAULT_JOB_PREFIX),
            max_log_entries,
            dataflow_endpoint: optional("FLOWWATCH_DATAFLOW_ENDPOINT", DEFAULT_DATAFLOW_ENDPOINT),
            logging_endpoint: optional("FLOWWATCH_LOGGING_ENDPOINT", DEFAULT_LOGGING_ENDPOINT),
            summary_endpoint: optional("FLOWWATCH_SUMMARY_ENDPOINT", DEFAULT_SUMMARY_ENDPOINT),
        })
    }

    pub fn require_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .ok_or_else(|| Error::Config("GOOGLE_API_KEY not set".to_string()))
    }
}
