use bundlecp_api::{ApiError, ApiResult};
use bundlecp_core::contributor::AnnotationsContributor;
use bundlecp_core::registry::{MemoryBundleRegistry, MemoryProjectModels, WorkspaceModel};
use bundlecp_core::storage::{CLASSPATH_FILE_SUFFIX, FileClasspathStore};
use bundlecp_core::{UpdateScheduler, UpdaterConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const STORE_DIR_ENV: &str = "BUNDLECP_STORE_DIR";
pub const DEFAULT_STORE_DIR: &str = ".bundlecp/classpaths";

/// Everything an update needs, loaded from a workspace description file.
pub struct Workspace {
    pub registry: Arc<MemoryBundleRegistry>,
    pub models: Arc<MemoryProjectModels>,
    pub store: Arc<FileClasspathStore>,
}

impl Workspace {
    /// Loads `model`. The store directory is `store_dir` when given, else the
    /// one named in the file, else [`default_store_dir`].
    pub fn load(model: &Path, store_dir: Option<PathBuf>) -> bundlecp_core::Result<Self> {
        let mut description = WorkspaceModel::load(model)?;
        let store_dir = store_dir
            .or_else(|| description.store.take())
            .unwrap_or_else(default_store_dir);
        let (registry, models) = description.into_parts();
        tracing::info!(
            "Loaded workspace {} ({} bundles, {} projects)",
            model.display(),
            registry.len(),
            models.projects().len()
        );
        Ok(Self {
            registry: Arc::new(registry),
            models: Arc::new(models),
            store: Arc::new(FileClasspathStore::new(store_dir)),
        })
    }
}

/// Bootstraps an update scheduler with the standard contributors.
///
/// Must be called inside a tokio runtime.
pub fn build_default_scheduler(
    workspace: &Workspace,
    config: UpdaterConfig,
) -> bundlecp_core::Result<UpdateScheduler> {
    let annotations = Arc::new(AnnotationsContributor::new(&config));
    UpdateScheduler::builder(
        workspace.registry.clone(),
        workspace.models.clone(),
        workspace.store.clone(),
    )
    .with_config(config)
    .with_contributor(annotations)
    .build()
}

/// Classpath store directory: `$BUNDLECP_STORE_DIR`, else
/// `~/.bundlecp/classpaths`.
pub fn default_store_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(STORE_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_STORE_DIR)
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> Option<impl Drop> {
    Some(bundlecp_core::logging::init_logging(component, to_stderr))
}

/// Removes every persisted classpath under `dir` and returns how many were
/// removed. Other files are left alone; the directory itself goes only once
/// it is empty.
pub fn clear_classpaths(dir: &Path) -> ApiResult<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let internal = |e: std::io::Error| ApiError::Internal(format!("{}: {e}", dir.display()));

    let mut removed = 0;
    for entry in std::fs::read_dir(dir).map_err(internal)? {
        let path = entry.map_err(internal)?.path();
        let is_classpath = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(CLASSPATH_FILE_SUFFIX));
        if is_classpath && path.is_file() {
            std::fs::remove_file(&path).map_err(internal)?;
            removed += 1;
        }
    }

    if std::fs::read_dir(dir).map_err(internal)?.next().is_none() {
        std::fs::remove_dir(dir).map_err(internal)?;
    }
    tracing::debug!("Removed {} classpath files from {}", removed, dir.display());
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlecp_api::{ClasspathStore, ProjectId, UpdateRequest};

    const WORKSPACE: &str = r#"{
        "bundles": [
            { "id": { "name": "org.osgi.annotation.versioning", "version": "1.1.2" },
              "location": "/t/org.osgi.annotation.versioning_1.1.2.jar" },
            { "id": { "name": "a", "version": "1.0.0" }, "location": "/t/a_1.0.0.jar" }
        ],
        "projects": [
            { "project": "p", "bundle": { "name": "p", "version": "1.0.0" }, "root": "/ws/p",
              "dependencies": [ { "target": "a", "visibility": "private" } ],
              "execution_environment": "JavaSE-17" }
        ]
    }"#;

    #[tokio::test]
    async fn test_default_scheduler_adds_annotation_bundles() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("workspace.json");
        std::fs::write(&model, WORKSPACE).unwrap();

        let workspace = Workspace::load(&model, Some(dir.path().join("store"))).unwrap();
        let scheduler = build_default_scheduler(&workspace, UpdaterConfig::default()).unwrap();
        let status = scheduler.schedule(UpdateRequest::new(["p"])).join().await;
        assert!(status.ok());

        let classpath = workspace
            .store
            .current_classpath(&ProjectId::from("p"))
            .unwrap()
            .unwrap();
        let names: Vec<_> = classpath.iter().filter_map(|e| e.last_segment()).collect();
        assert_eq!(
            names,
            vec![
                "a_1.0.0.jar",
                "JavaSE-17",
                "org.osgi.annotation.versioning_1.1.2.jar"
            ]
        );

        assert_eq!(clear_classpaths(workspace.store.dir()).unwrap(), 1);
        assert!(!workspace.store.dir().exists());
    }

    #[test]
    fn test_clear_leaves_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("p.classpath.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(clear_classpaths(dir.path()).unwrap(), 1);

        assert!(!dir.path().join("p.classpath.json").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("nested").is_dir());
        assert!(dir.path().exists());
    }

    #[test]
    fn test_load_missing_workspace_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Workspace::load(&dir.path().join("nope.json"), None).is_err());
    }
}
