//! Background classpath updates: per-project serialization, coalescing and
//! cancel-before-commit, on top of the keyed job runtime.

mod pipeline;
mod status;

use std::sync::Arc;

use bundlecp_api::{
    BundleRegistry, ClasspathContributor, ClasspathStore, ProjectId, ProjectModelProvider,
    UpdateReport, UpdateRequest,
};
use bundlecp_jobs::{JobHandle, JobRuntime, RuntimeComponents, RuntimeStats};
use tracing::debug;

use crate::classpath::ClasspathBuilder;
use crate::config::UpdaterConfig;
use crate::error::Result;

pub use pipeline::{ClasspathPipeline, ComputedClasspath, UpdatePayload};
pub use status::{ProjectStatus, UpdateStatus};

type UpdateJobs = JobRuntime<ProjectId, UpdatePayload, ComputedClasspath, UpdateReport>;

pub struct UpdateScheduler {
    jobs: UpdateJobs,
    pipeline: Arc<ClasspathPipeline>,
}

pub struct UpdateSchedulerBuilder {
    registry: Arc<dyn BundleRegistry>,
    models: Arc<dyn ProjectModelProvider>,
    store: Arc<dyn ClasspathStore>,
    config: UpdaterConfig,
    contributors: Vec<Arc<dyn ClasspathContributor>>,
}

impl UpdateSchedulerBuilder {
    pub fn new(
        registry: Arc<dyn BundleRegistry>,
        models: Arc<dyn ProjectModelProvider>,
        store: Arc<dyn ClasspathStore>,
    ) -> Self {
        Self {
            registry,
            models,
            store,
            config: UpdaterConfig::default(),
            contributors: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: UpdaterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_contributor(mut self, contributor: Arc<dyn ClasspathContributor>) -> Self {
        self.contributors.push(contributor);
        self
    }

    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Result<UpdateScheduler> {
        let builder = self
            .contributors
            .into_iter()
            .fold(ClasspathBuilder::new(&self.config), |b, c| b.with_contributor(c));
        let pipeline = Arc::new(ClasspathPipeline::new(
            self.registry,
            self.models,
            self.store,
            builder,
        ));

        let jobs = JobRuntime::new(
            self.config.runtime_config(),
            RuntimeComponents {
                executor: pipeline.clone(),
                commit_sink: pipeline.clone(),
            },
        )?;
        Ok(UpdateScheduler { jobs, pipeline })
    }
}

impl UpdateScheduler {
    pub fn builder(
        registry: Arc<dyn BundleRegistry>,
        models: Arc<dyn ProjectModelProvider>,
        store: Arc<dyn ClasspathStore>,
    ) -> UpdateSchedulerBuilder {
        UpdateSchedulerBuilder::new(registry, models, store)
    }

    /// Queues an update for every project of `request`. Requests for a
    /// project that is already queued or running fold into its next run.
    pub fn schedule(&self, request: UpdateRequest) -> UpdateHandle {
        let payload = UpdatePayload {
            overrides: request.overrides,
            full_rebuild: request.full_rebuild,
        };
        let tickets: Vec<_> = request
            .projects
            .into_iter()
            .map(|project| self.jobs.submit(project, payload.clone()))
            .collect();
        debug!(projects = tickets.len(), "Scheduled classpath update");
        UpdateHandle { tickets }
    }

    /// Cancels every project of `handle`. Queued work is dropped right away;
    /// a running update finishes but is not committed. Returns `true` if any
    /// queued work was removed.
    pub fn cancel(&self, handle: &UpdateHandle) -> bool {
        handle
            .tickets
            .iter()
            .map(|ticket| self.jobs.cancel(ticket))
            .fold(false, |any, removed| any || removed)
    }

    pub fn is_busy(&self, project: &ProjectId) -> bool {
        self.jobs.is_busy(project)
    }

    pub fn pending(&self, project: &ProjectId) -> usize {
        self.jobs.pending(project)
    }

    pub fn stats(&self) -> RuntimeStats {
        self.jobs.stats()
    }

    pub fn pipeline(&self) -> &ClasspathPipeline {
        &self.pipeline
    }

    /// Drops queued work and waits for running updates.
    pub async fn shutdown(&self) {
        self.jobs.shutdown().await;
    }
}

/// Tickets of one scheduled request, one per project.
pub struct UpdateHandle {
    tickets: Vec<JobHandle<ProjectId, UpdateReport>>,
}

impl UpdateHandle {
    pub fn projects(&self) -> impl Iterator<Item = &ProjectId> {
        self.tickets.iter().map(|t| t.key())
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.tickets.iter().any(|t| t.is_cancel_requested())
    }

    /// Waits for every project to reach a terminal state.
    pub async fn join(self) -> UpdateStatus {
        let mut projects = Vec::with_capacity(self.tickets.len());
        for ticket in self.tickets {
            let project = ticket.key().clone();
            let outcome = ticket.join().await;
            projects.push((project, ProjectStatus::from(outcome)));
        }
        UpdateStatus::new(projects)
    }
}
