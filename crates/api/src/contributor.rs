use crate::models::{BundleDescriptor, ClasspathEntry, ProjectManifest};
use crate::registry::BundleRegistry;

/// Hook for entries that are not declared in the manifest but belong on the
/// computed classpath.
pub trait ClasspathContributor: Send + Sync {
    /// Entries placed after the execution environment.
    fn initial_entries(
        &self,
        project: &ProjectManifest,
        registry: &dyn BundleRegistry,
    ) -> Vec<ClasspathEntry>;

    /// Entries placed right after those of `dependency`.
    fn entries_for_dependency(
        &self,
        _project: &ProjectManifest,
        _dependency: &BundleDescriptor,
    ) -> Vec<ClasspathEntry> {
        Vec::new()
    }

    fn name(&self) -> &str;
}
