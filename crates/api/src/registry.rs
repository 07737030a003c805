use std::path::Path;
use std::sync::Arc;

use crate::models::{BundleDescriptor, BundleId, BundleRequirement, ProjectId, ProjectManifest};

/// Read-only view of the bundles available to a workspace.
///
/// Lookups may block on I/O; callers run them off the async executor.
pub trait BundleRegistry: Send + Sync {
    /// Best (highest version) bundle satisfying the requirement.
    fn find_bundle(&self, requirement: &BundleRequirement) -> Option<Arc<BundleDescriptor>>;

    fn is_enabled(&self, id: &BundleId) -> bool;

    /// Any installed bundle a classpath entry at `path` would come from.
    fn bundle_at(&self, path: &Path) -> Option<Arc<BundleDescriptor>>;
}

/// Source of project manifests.
pub trait ProjectModelProvider: Send + Sync {
    fn manifest(&self, project: &ProjectId) -> Option<ProjectManifest>;
}
