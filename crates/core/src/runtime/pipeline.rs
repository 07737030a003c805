use std::sync::Arc;

use bundlecp_api::{
    BundleRegistry, ClasspathSnapshot, ClasspathStore, EntryOverrides, ProjectId,
    ProjectModelProvider, ResolutionWarning, UpdateReport,
};
use bundlecp_jobs::{Coalesce, CommitSink, Executor, JobError};
use tracing::{debug, info};

use crate::classpath::ClasspathBuilder;
use crate::error::{ClasspathError, Result};
use crate::merge::{AttributeMerger, DerivedEntries};
use crate::resolver::DependencyResolver;

/// What one project's queued update requests amount to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePayload {
    pub overrides: EntryOverrides,
    pub full_rebuild: bool,
}

impl Coalesce for UpdatePayload {
    fn coalesce(&mut self, newer: Self) {
        self.overrides.absorb(newer.overrides);
        self.full_rebuild |= newer.full_rebuild;
    }
}

/// Classpath computed for a project but not yet persisted.
#[derive(Debug, Clone)]
pub struct ComputedClasspath {
    pub snapshot: ClasspathSnapshot,
    pub previous: Option<ClasspathSnapshot>,
    pub warnings: Vec<ResolutionWarning>,
}

/// resolve -> build -> merge, then replace in the store.
pub struct ClasspathPipeline {
    registry: Arc<dyn BundleRegistry>,
    models: Arc<dyn ProjectModelProvider>,
    store: Arc<dyn ClasspathStore>,
    builder: ClasspathBuilder,
}

impl ClasspathPipeline {
    pub fn new(
        registry: Arc<dyn BundleRegistry>,
        models: Arc<dyn ProjectModelProvider>,
        store: Arc<dyn ClasspathStore>,
        builder: ClasspathBuilder,
    ) -> Self {
        Self {
            registry,
            models,
            store,
            builder,
        }
    }

    pub fn compute(&self, project: &ProjectId, payload: &UpdatePayload) -> Result<ComputedClasspath> {
        let manifest = self
            .models
            .manifest(project)
            .ok_or_else(|| ClasspathError::MissingManifest(project.clone()))?;
        let previous = self.store.current_classpath(project)?;

        let resolution = DependencyResolver::new(self.registry.as_ref()).resolve(&manifest);
        let built = self.builder.build(
            &manifest,
            &resolution,
            self.registry.as_ref(),
            &payload.overrides,
        );

        let snapshot = match &previous {
            Some(prev) if !payload.full_rebuild => {
                let derived = DerivedEntries::new(self.registry.as_ref(), &manifest);
                AttributeMerger::merge(&built.snapshot, prev, &payload.overrides, &derived)
            }
            _ => built.snapshot,
        };

        let mut warnings = resolution.warnings;
        warnings.extend(built.warnings);

        debug!(
            project = %project,
            entries = snapshot.len(),
            full_rebuild = payload.full_rebuild,
            "Computed classpath"
        );
        Ok(ComputedClasspath {
            snapshot,
            previous,
            warnings,
        })
    }

    pub fn commit(&self, project: &ProjectId, computed: ComputedClasspath) -> Result<UpdateReport> {
        let changed = computed.previous.as_ref() != Some(&computed.snapshot);
        self.store.replace_classpath(project, &computed.snapshot)?;
        info!(
            project = %project,
            entries = computed.snapshot.len(),
            changed,
            warnings = computed.warnings.len(),
            "Classpath updated"
        );
        Ok(UpdateReport {
            project: project.clone(),
            entries: computed.snapshot.len(),
            changed,
            warnings: computed.warnings,
        })
    }
}

impl Executor<ProjectId, UpdatePayload, ComputedClasspath> for ClasspathPipeline {
    fn execute(
        &self,
        key: &ProjectId,
        payload: UpdatePayload,
    ) -> std::result::Result<ComputedClasspath, JobError> {
        Ok(self.compute(key, &payload)?)
    }
}

impl CommitSink<ProjectId, ComputedClasspath, UpdateReport> for ClasspathPipeline {
    fn commit(
        &self,
        key: &ProjectId,
        computed: ComputedClasspath,
    ) -> std::result::Result<UpdateReport, JobError> {
        Ok(ClasspathPipeline::commit(self, key, computed)?)
    }
}
