use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The platform reported a job state ordinal outside the known enumeration.
    #[error("job state ordinal {ordinal} is outside the known range 0..=12")]
    OutOfRange { ordinal: i64 },
    /// The platform rejected a launch. `cause` is the platform's message, untouched.
    #[error("job launch rejected: {cause}")]
    Launch { cause: String },
    #[error("job listing failed: {cause}")]
    List { cause: String },
    #[error(
        "job {job_id} has no errors in the last {window_minutes} minutes; run discovery again to refresh the candidate list"
    )]
    UnknownJob { job_id: String, window_minutes: u32 },
    #[error("remote call failed: {cause}")]
    Remote { cause: String },
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn launch(err: anyhow::Error) -> Self {
        Self::Launch {
            cause: format!("{err:#}"),
        }
    }

    pub fn list(err: anyhow::Error) -> Self {
        Self::List {
            cause: format!("{err:#}"),
        }
    }

    pub fn remote(err: anyhow::Error) -> Self {
        Self::Remote {
            cause: format!("{err:#}"),
        }
    }
}
