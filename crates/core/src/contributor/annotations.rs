use bundlecp_api::{
    BundleRegistry, BundleRequirement, ClasspathContributor, ClasspathEntry, ProjectManifest,
};
use tracing::trace;

use crate::classpath::EntryFactory;
use crate::config::UpdaterConfig;

/// Annotation bundles every project may compile against without declaring
/// them.
pub const OSGI_ANNOTATION_BUNDLES: [&str; 4] = [
    "org.osgi.annotation.versioning",
    "org.osgi.annotation.bundle",
    "org.osgi.service.component.annotations",
    "org.osgi.service.metatype.annotations",
];

/// Adds the standard OSGi annotation bundles to every classpath, unexported.
pub struct AnnotationsContributor {
    bundles: Vec<String>,
    factory: EntryFactory,
}

impl AnnotationsContributor {
    pub fn new(config: &UpdaterConfig) -> Self {
        Self::with_bundles(config, OSGI_ANNOTATION_BUNDLES)
    }

    pub fn with_bundles(
        config: &UpdaterConfig,
        bundles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            bundles: bundles.into_iter().map(Into::into).collect(),
            factory: EntryFactory::from_config(config),
        }
    }
}

impl ClasspathContributor for AnnotationsContributor {
    fn initial_entries(
        &self,
        project: &ProjectManifest,
        registry: &dyn BundleRegistry,
    ) -> Vec<ClasspathEntry> {
        let mut entries = Vec::new();
        for name in &self.bundles {
            if *name == project.bundle.name {
                continue;
            }
            let Some(bundle) = registry.find_bundle(&BundleRequirement::new(name.as_str())) else {
                trace!(bundle = %name, "Annotation bundle not installed");
                continue;
            };
            if !registry.is_enabled(&bundle.id) {
                continue;
            }
            entries.extend(self.factory.bundle_entries(&bundle, false).entries);
        }
        entries
    }

    fn name(&self) -> &str {
        "osgi-annotations"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryBundleRegistry;
    use bundlecp_api::{BundleDescriptor, BundleId, Version};
    use std::path::PathBuf;

    fn annotation_bundle(name: &str) -> BundleDescriptor {
        BundleDescriptor::new(
            BundleId::new(name, Version::new(1, 0, 0)),
            format!("/t/{name}_1.0.0.jar"),
        )
    }

    #[test]
    fn test_installed_enabled_bundles_only() {
        let registry = MemoryBundleRegistry::from_bundles([
            annotation_bundle("org.osgi.annotation.versioning"),
            annotation_bundle("org.osgi.annotation.bundle"),
            annotation_bundle("org.osgi.service.component.annotations"),
        ]);
        registry.disable(&BundleId::new("org.osgi.annotation.bundle", Version::new(1, 0, 0)));
        let project = ProjectManifest::new(
            "ds",
            BundleId::new("org.osgi.service.component.annotations", Version::new(1, 0, 0)),
            "/ws/ds",
        );

        let entries =
            AnnotationsContributor::new(&UpdaterConfig::default()).initial_entries(&project, &registry);

        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].path,
            PathBuf::from("/t/org.osgi.annotation.versioning_1.0.0.jar")
        );
        assert!(!entries[0].exported);
    }
}
