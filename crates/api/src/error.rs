#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failure reported by a [`crate::ClasspathStore`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("classpath of '{project}' could not be read: {reason}")]
    Read { project: String, reason: String },
    #[error("classpath of '{project}' was rejected: {reason}")]
    Write { project: String, reason: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
