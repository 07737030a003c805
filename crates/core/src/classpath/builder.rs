use std::sync::Arc;

use bundlecp_api::{
    BundleRegistry, ClasspathContributor, ClasspathEntry, ClasspathSnapshot, EntryOverrides,
    ProjectManifest, ResolutionWarning,
};
use tracing::{debug, trace};

use super::entry::{is_bundle_root, EntryFactory};
use super::environment::environment_entry;
use crate::config::UpdaterConfig;
use crate::resolver::Resolution;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    pub snapshot: ClasspathSnapshot,
    pub warnings: Vec<ResolutionWarning>,
}

/// Computes the default classpath of a project from its resolved
/// dependencies.
///
/// Order: every resolved bundle (with its embedded libraries and the entries
/// contributors attach to it), the project's own libraries, the execution
/// environment, then contributor entries. Later duplicates are dropped.
#[derive(Clone)]
pub struct ClasspathBuilder {
    factory: EntryFactory,
    modular_floor: u32,
    contributors: Vec<Arc<dyn ClasspathContributor>>,
}

impl ClasspathBuilder {
    pub fn new(config: &UpdaterConfig) -> Self {
        Self {
            factory: EntryFactory::from_config(config),
            modular_floor: config.modular_environment_floor,
            contributors: Vec::new(),
        }
    }

    pub fn with_contributor(mut self, contributor: Arc<dyn ClasspathContributor>) -> Self {
        self.contributors.push(contributor);
        self
    }

    pub fn contributors(&self) -> impl Iterator<Item = &str> {
        self.contributors.iter().map(|c| c.name())
    }

    pub fn build(
        &self,
        manifest: &ProjectManifest,
        resolution: &Resolution,
        registry: &dyn BundleRegistry,
        overrides: &EntryOverrides,
    ) -> BuildOutput {
        let mut assembly = Assembly {
            overrides,
            out: BuildOutput::default(),
        };

        for resolved in &resolution.bundles {
            let built = self
                .factory
                .bundle_entries(&resolved.descriptor, resolved.is_reexported());
            assembly.out.warnings.extend(built.warnings);
            assembly.extend(built.entries);

            for contributor in &self.contributors {
                let extra = contributor.entries_for_dependency(manifest, &resolved.descriptor);
                trace!(
                    contributor = contributor.name(),
                    bundle = %resolved.id(),
                    count = extra.len(),
                    "Contributor entries for dependency"
                );
                assembly.extend(extra);
            }
        }

        for library in manifest.libraries.iter().filter(|l| !is_bundle_root(l)) {
            assembly.push(self.factory.project_library(manifest, library));
        }

        assembly.push(environment_entry(
            manifest.execution_environment.as_deref(),
            self.modular_floor,
        ));

        for contributor in &self.contributors {
            assembly.extend(contributor.initial_entries(manifest, registry));
        }

        debug!(
            project = %manifest.project,
            entries = assembly.out.snapshot.len(),
            "Built default classpath"
        );
        assembly.out
    }
}

struct Assembly<'a> {
    overrides: &'a EntryOverrides,
    out: BuildOutput,
}

impl Assembly<'_> {
    fn push(&mut self, mut entry: ClasspathEntry) {
        entry.derived = true;
        self.overrides.apply(&mut entry);
        let identity = entry.identity();
        if !self.out.snapshot.push(entry) {
            trace!(entry = %identity, "Dropping duplicate entry");
        }
    }

    fn extend(&mut self, entries: impl IntoIterator<Item = ClasspathEntry>) {
        for entry in entries {
            self.push(entry);
        }
    }
}
