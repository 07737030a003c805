//! In-memory registry of installed bundles and workspace project models.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bundlecp_api::{
    BundleDescriptor, BundleId, BundleRegistry, BundleRequirement, ProjectId, ProjectManifest,
    ProjectModelProvider,
};
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Bundles by symbolic name, every version kept in ascending order.
#[derive(Default)]
pub struct MemoryBundleRegistry {
    bundles: DashMap<String, Vec<Arc<BundleDescriptor>>>,
    disabled: DashSet<BundleId>,
}

impl MemoryBundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bundles(bundles: impl IntoIterator<Item = BundleDescriptor>) -> Self {
        let registry = Self::new();
        for bundle in bundles {
            registry.insert(bundle);
        }
        registry
    }

    /// Adds a bundle, replacing any bundle with the same id.
    pub fn insert(&self, bundle: BundleDescriptor) {
        let mut versions = self.bundles.entry(bundle.id.name.clone()).or_default();
        versions.retain(|b| b.id != bundle.id);
        let at = versions.partition_point(|b| b.id.version < bundle.id.version);
        versions.insert(at, Arc::new(bundle));
    }

    pub fn remove(&self, id: &BundleId) -> bool {
        let Some(mut versions) = self.bundles.get_mut(&id.name) else {
            return false;
        };
        let before = versions.len();
        versions.retain(|b| &b.id != id);
        before != versions.len()
    }

    pub fn disable(&self, id: &BundleId) {
        self.disabled.insert(id.clone());
    }

    pub fn enable(&self, id: &BundleId) {
        self.disabled.remove(id);
    }

    pub fn len(&self) -> usize {
        self.bundles.iter().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BundleRegistry for MemoryBundleRegistry {
    fn find_bundle(&self, requirement: &BundleRequirement) -> Option<Arc<BundleDescriptor>> {
        let versions = self.bundles.get(&requirement.name)?;
        versions
            .iter()
            .rev()
            .find(|b| requirement.matches(&b.id))
            .cloned()
    }

    fn is_enabled(&self, id: &BundleId) -> bool {
        !self.disabled.contains(id)
    }

    fn bundle_at(&self, path: &Path) -> Option<Arc<BundleDescriptor>> {
        self.bundles
            .iter()
            .find_map(|versions| versions.iter().find(|b| b.provides_path(path)).cloned())
    }
}

#[derive(Default)]
pub struct MemoryProjectModels {
    manifests: DashMap<ProjectId, ProjectManifest>,
}

impl MemoryProjectModels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifests(manifests: impl IntoIterator<Item = ProjectManifest>) -> Self {
        let models = Self::new();
        for manifest in manifests {
            models.insert(manifest);
        }
        models
    }

    /// Stores a manifest, returning the one it replaced.
    pub fn insert(&self, manifest: ProjectManifest) -> Option<ProjectManifest> {
        self.manifests.insert(manifest.project.clone(), manifest)
    }

    pub fn remove(&self, project: &ProjectId) -> Option<ProjectManifest> {
        self.manifests.remove(project).map(|(_, m)| m)
    }

    pub fn projects(&self) -> Vec<ProjectId> {
        let mut ids: Vec<_> = self.manifests.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

impl ProjectModelProvider for MemoryProjectModels {
    fn manifest(&self, project: &ProjectId) -> Option<ProjectManifest> {
        self.manifests.get(project).map(|m| m.clone())
    }
}

/// On-disk description of a workspace: installed bundles, disabled ids,
/// project manifests and where their classpaths are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceModel {
    /// Relative paths are taken from the directory of the workspace file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<PathBuf>,
    #[serde(default)]
    pub bundles: Vec<BundleDescriptor>,
    #[serde(default)]
    pub disabled: Vec<BundleId>,
    #[serde(default)]
    pub projects: Vec<ProjectManifest>,
}

impl WorkspaceModel {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut model: Self = serde_json::from_str(&content)?;
        if let (Some(store), Some(base)) = (model.store.as_mut(), path.parent()) {
            if store.is_relative() {
                *store = base.join(&*store);
            }
        }
        Ok(model)
    }

    /// Splits the model into the registry and the project models. The store
    /// location is not part of either.
    pub fn into_parts(self) -> (MemoryBundleRegistry, MemoryProjectModels) {
        let registry = MemoryBundleRegistry::from_bundles(self.bundles);
        for id in &self.disabled {
            registry.disable(id);
        }
        (registry, MemoryProjectModels::from_manifests(self.projects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlecp_api::Version;

    fn descriptor(name: &str, version: Version) -> BundleDescriptor {
        BundleDescriptor::new(BundleId::new(name, version), format!("/target/{name}.jar"))
    }

    #[test]
    fn test_find_bundle_picks_highest_matching_version() {
        let registry = MemoryBundleRegistry::from_bundles([
            descriptor("a", Version::new(2, 0, 0)),
            descriptor("a", Version::new(1, 0, 0)),
            descriptor("a", Version::new(3, 1, 0)),
        ]);

        let found = registry.find_bundle(&BundleRequirement::new("a")).unwrap();
        assert_eq!(found.id.version, Version::new(3, 1, 0));

        let bounded = BundleRequirement::new("a").at_least(Version::new(4, 0, 0));
        assert!(registry.find_bundle(&bounded).is_none());
        assert!(registry.find_bundle(&BundleRequirement::new("b")).is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let registry = MemoryBundleRegistry::new();
        registry.insert(descriptor("a", Version::new(1, 0, 0)));
        registry.insert(
            descriptor("a", Version::new(1, 0, 0)).with_exported_package("a.api"),
        );

        assert_eq!(registry.len(), 1);
        let found = registry.find_bundle(&BundleRequirement::new("a")).unwrap();
        assert_eq!(found.exported_packages, vec!["a.api".to_string()]);
    }

    #[test]
    fn test_bundle_at_finds_any_version() {
        let registry = MemoryBundleRegistry::from_bundles([
            descriptor("a", Version::new(1, 0, 0)),
            BundleDescriptor::new(BundleId::new("b", Version::new(2, 0, 0)), "/target/b")
                .with_library("lib/x.jar"),
        ]);

        let a = registry.bundle_at(Path::new("/target/a.jar")).unwrap();
        assert_eq!(a.id.name, "a");
        let b = registry.bundle_at(Path::new("/target/b/lib/x.jar")).unwrap();
        assert_eq!(b.id.name, "b");
        assert!(registry.bundle_at(Path::new("/opt/tools.jar")).is_none());
    }

    #[test]
    fn test_disable_and_enable() {
        let registry = MemoryBundleRegistry::from_bundles([descriptor("a", Version::new(1, 0, 0))]);
        let id = BundleId::new("a", Version::new(1, 0, 0));

        registry.disable(&id);
        assert!(!registry.is_enabled(&id));
        registry.enable(&id);
        assert!(registry.is_enabled(&id));
    }

    #[test]
    fn test_workspace_model_from_json() {
        let json = r#"{
            "bundles": [
                { "id": { "name": "a", "version": "1.0.0" }, "location": "/t/a.jar" }
            ],
            "disabled": [ { "name": "a", "version": "1.0.0" } ],
            "projects": [
                {
                    "project": "p",
                    "bundle": { "name": "p", "version": "1.0.0.qualifier" },
                    "root": "/ws/p",
                    "dependencies": [ { "target": "a", "visibility": "reexport" } ]
                }
            ]
        }"#;
        let model: WorkspaceModel = serde_json::from_str(json).unwrap();
        let (registry, models) = model.into_parts();

        assert!(!registry.is_enabled(&BundleId::new("a", Version::new(1, 0, 0))));
        let manifest = models.manifest(&ProjectId::from("p")).unwrap();
        assert_eq!(manifest.dependencies.len(), 1);
        assert_eq!(models.projects(), vec![ProjectId::from("p")]);
    }

    #[test]
    fn test_relative_store_is_anchored_at_workspace_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");
        std::fs::write(&path, r#"{ "store": "classpaths" }"#).unwrap();

        let model = WorkspaceModel::load(&path).unwrap();
        assert_eq!(model.store, Some(dir.path().join("classpaths")));
        assert!(model.bundles.is_empty());
    }
}
