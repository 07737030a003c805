//! Dependency closure of a project: direct dependencies plus everything
//! they re-export, in classpath order.

use std::collections::HashMap;
use std::sync::Arc;

use bundlecp_api::{
    BundleDescriptor, BundleId, BundleRegistry, Dependency, DependencyKind, ProjectManifest,
    ResolutionState, ResolutionWarning, Visibility,
};
use indexmap::IndexMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBundle {
    pub descriptor: Arc<BundleDescriptor>,
    /// Highest visibility the bundle was reached with.
    pub visibility: Visibility,
    /// Kind of the dependency that first reached the bundle.
    pub kind: DependencyKind,
}

impl ResolvedBundle {
    pub fn id(&self) -> &BundleId {
        &self.descriptor.id
    }

    pub fn is_reexported(&self) -> bool {
        self.visibility == Visibility::Reexport
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub bundles: Vec<ResolvedBundle>,
    pub warnings: Vec<ResolutionWarning>,
}

impl Resolution {
    pub fn find(&self, name: &str) -> Option<&ResolvedBundle> {
        self.bundles.iter().find(|b| b.descriptor.id.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.bundles
            .iter()
            .map(|b| b.descriptor.id.name.as_str())
            .collect()
    }
}

pub struct DependencyResolver<'a> {
    registry: &'a dyn BundleRegistry,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(registry: &'a dyn BundleRegistry) -> Self {
        Self { registry }
    }

    /// Expands `manifest`'s dependencies depth-first.
    ///
    /// A bundle appears once, at its first position, carrying the highest
    /// visibility it was reached with. Re-exported dependencies of a bundle
    /// follow it directly and inherit the visibility the bundle was reached
    /// with.
    pub fn resolve(&self, manifest: &ProjectManifest) -> Resolution {
        let mut walk = Walk {
            manifest,
            registry: self.registry,
            order: IndexMap::new(),
            traversed: HashMap::new(),
            warnings: Vec::new(),
        };
        for dependency in &manifest.dependencies {
            walk.visit(dependency, None);
        }

        debug!(
            project = %manifest.project,
            bundles = walk.order.len(),
            warnings = walk.warnings.len(),
            "Resolved dependency closure"
        );

        Resolution {
            bundles: walk.order.into_values().collect(),
            warnings: walk.warnings,
        }
    }
}

struct Walk<'m> {
    manifest: &'m ProjectManifest,
    registry: &'m dyn BundleRegistry,
    order: IndexMap<BundleId, ResolvedBundle>,
    /// Visibility each bundle's re-exports were last expanded with.
    traversed: HashMap<BundleId, Visibility>,
    warnings: Vec<ResolutionWarning>,
}

impl Walk<'_> {
    fn visit(&mut self, dependency: &Dependency, inherited: Option<Visibility>) {
        if dependency.target == self.manifest.bundle.name {
            debug!(project = %self.manifest.project, "Skipping self reference");
            return;
        }
        let Some(descriptor) = self.lookup(dependency) else {
            return;
        };
        let visibility = inherited.unwrap_or(dependency.visibility);
        let id = descriptor.id.clone();

        let effective = match self.order.get_mut(&id) {
            Some(existing) => {
                existing.visibility = existing.visibility.max(visibility);
                existing.visibility
            }
            None => {
                self.order.insert(
                    id.clone(),
                    ResolvedBundle {
                        descriptor: Arc::clone(&descriptor),
                        visibility,
                        kind: dependency.kind,
                    },
                );
                visibility
            }
        };

        // Fragments see everything their host re-exports.
        let expands =
            effective == Visibility::Reexport || dependency.kind == DependencyKind::FragmentHost;
        // Re-expand when the visibility rose, so re-exports inherit it.
        if !expands || self.traversed.get(&id).is_some_and(|seen| *seen >= effective) {
            return;
        }
        self.traversed.insert(id, effective);
        for nested in descriptor
            .dependencies
            .iter()
            .filter(|d| d.visibility == Visibility::Reexport)
        {
            self.visit(nested, Some(effective));
        }
    }

    fn lookup(&mut self, dependency: &Dependency) -> Option<Arc<BundleDescriptor>> {
        let optional = dependency.visibility == Visibility::Optional;

        let found = match dependency.state {
            ResolutionState::Resolved => self.registry.find_bundle(&dependency.requirement()),
            ResolutionState::Unresolved => None,
        };
        let Some(descriptor) = found else {
            self.warn(
                optional,
                ResolutionWarning::UnresolvedDependency {
                    target: dependency.target.clone(),
                },
            );
            return None;
        };

        if !self.registry.is_enabled(&descriptor.id) {
            self.warn(
                optional,
                ResolutionWarning::DisabledBundle {
                    bundle: descriptor.id.clone(),
                },
            );
            return None;
        }
        Some(descriptor)
    }

    fn warn(&mut self, optional: bool, warning: ResolutionWarning) {
        if optional {
            debug!(project = %self.manifest.project, "Skipping optional dependency: {}", warning);
            return;
        }
        if self.warnings.contains(&warning) {
            return;
        }
        warn!(project = %self.manifest.project, "{}", warning);
        self.warnings.push(warning);
    }
}
