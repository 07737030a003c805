use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("commit failed: {0}")]
    Commit(String),
    #[error("task join failure: {0}")]
    Join(String),
    #[error("job runtime requires a tokio runtime: {0}")]
    NoRuntime(String),
    #[error("job runtime shut down")]
    Shutdown,
}
