use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::bundle::{BundleId, Dependency};

/// Workspace project name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Dependency declarations of a workspace project, as read from its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub project: ProjectId,
    pub bundle: BundleId,
    pub root: PathBuf,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Bundle-ClassPath of the project itself, relative to `root`.
    #[serde(default)]
    pub libraries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_environment: Option<String>,
}

impl ProjectManifest {
    pub fn new(project: impl Into<ProjectId>, bundle: BundleId, root: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            bundle,
            root: root.into(),
            dependencies: Vec::new(),
            libraries: Vec::new(),
            execution_environment: None,
        }
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.libraries.push(library.into());
        self
    }

    pub fn with_execution_environment(mut self, env: impl Into<String>) -> Self {
        self.execution_environment = Some(env.into());
        self
    }
}
