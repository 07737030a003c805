use bundlecp_api::{ProjectId, ResolutionWarning, UpdateReport};
use bundlecp_jobs::JobOutcome;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProjectStatus {
    Ok(UpdateReport),
    Failed { cause: String },
    Cancelled,
}

impl From<JobOutcome<UpdateReport>> for ProjectStatus {
    fn from(outcome: JobOutcome<UpdateReport>) -> Self {
        match outcome {
            JobOutcome::Completed(report) => ProjectStatus::Ok(report),
            JobOutcome::Failed(e) => ProjectStatus::Failed {
                cause: e.to_string(),
            },
            JobOutcome::Cancelled => ProjectStatus::Cancelled,
        }
    }
}

/// Terminal state of every project of one scheduled request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateStatus {
    pub projects: Vec<(ProjectId, ProjectStatus)>,
}

impl UpdateStatus {
    pub fn new(projects: Vec<(ProjectId, ProjectStatus)>) -> Self {
        Self { projects }
    }

    /// Every project was updated.
    pub fn ok(&self) -> bool {
        self.projects
            .iter()
            .all(|(_, s)| matches!(s, ProjectStatus::Ok(_)))
    }

    pub fn is_cancelled(&self) -> bool {
        self.projects
            .iter()
            .any(|(_, s)| matches!(s, ProjectStatus::Cancelled))
    }

    pub fn warnings(&self) -> Vec<&ResolutionWarning> {
        self.reports().flat_map(|r| r.warnings.iter()).collect()
    }

    /// First failure, if any.
    pub fn cause(&self) -> Option<&str> {
        self.projects.iter().find_map(|(_, s)| match s {
            ProjectStatus::Failed { cause } => Some(cause.as_str()),
            _ => None,
        })
    }

    pub fn status(&self, project: &ProjectId) -> Option<&ProjectStatus> {
        self.projects
            .iter()
            .find(|(p, _)| p == project)
            .map(|(_, s)| s)
    }

    pub fn report(&self, project: &ProjectId) -> Option<&UpdateReport> {
        match self.status(project)? {
            ProjectStatus::Ok(report) => Some(report),
            _ => None,
        }
    }

    pub fn reports(&self) -> impl Iterator<Item = &UpdateReport> {
        self.projects.iter().filter_map(|(_, s)| match s {
            ProjectStatus::Ok(report) => Some(report),
            _ => None,
        })
    }
}
