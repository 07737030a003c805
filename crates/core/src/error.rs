use bundlecp_api::{ProjectId, StoreError};
use bundlecp_jobs::JobError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClasspathError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("No manifest for project '{0}'")]
    MissingManifest(ProjectId),
    #[error("Scheduler error: {0}")]
    Job(#[from] JobError),
}

impl From<ClasspathError> for JobError {
    fn from(err: ClasspathError) -> Self {
        match err {
            ClasspathError::Store(e @ StoreError::Write { .. }) => JobError::Commit(e.to_string()),
            ClasspathError::Job(e) => e,
            other => JobError::Execution(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClasspathError>;
