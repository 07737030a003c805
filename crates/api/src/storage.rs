use crate::error::StoreResult;
use crate::models::{ClasspathSnapshot, ProjectId};

/// Persistence of project classpaths.
///
/// Both operations are single-shot: a reader never observes a partially
/// replaced classpath.
pub trait ClasspathStore: Send + Sync {
    /// `Ok(None)` when the project has no persisted classpath yet.
    fn current_classpath(&self, project: &ProjectId) -> StoreResult<Option<ClasspathSnapshot>>;

    fn replace_classpath(&self, project: &ProjectId, snapshot: &ClasspathSnapshot) -> StoreResult<()>;
}
