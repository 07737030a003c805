use std::io::Write;
use std::path::{Path, PathBuf};

use bundlecp_api::{ClasspathSnapshot, ClasspathStore, ProjectId, StoreError, StoreResult};
use tempfile::NamedTempFile;

pub const CLASSPATH_FILE_SUFFIX: &str = ".classpath.json";

/// One JSON file per project under `dir`, replaced via temp file + rename.
#[derive(Debug, Clone)]
pub struct FileClasspathStore {
    dir: PathBuf,
}

impl FileClasspathStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, project: &ProjectId) -> PathBuf {
        let name: String = project
            .as_str()
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.dir.join(format!("{name}{CLASSPATH_FILE_SUFFIX}"))
    }

    fn write_atomically(&self, path: &Path, snapshot: &ClasspathSnapshot) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut temp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut temp, snapshot)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl ClasspathStore for FileClasspathStore {
    fn current_classpath(&self, project: &ProjectId) -> StoreResult<Option<ClasspathSnapshot>> {
        let path = self.path_for(project);
        let read_error = |reason: String| StoreError::Read {
            project: project.to_string(),
            reason,
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(read_error(format!("{}: {e}", path.display()))),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| read_error(format!("{}: {e}", path.display())))
    }

    fn replace_classpath(&self, project: &ProjectId, snapshot: &ClasspathSnapshot) -> StoreResult<()> {
        let path = self.path_for(project);
        self.write_atomically(&path, snapshot)
            .map_err(|e| StoreError::Write {
                project: project.to_string(),
                reason: format!("{}: {e}", path.display()),
            })?;
        tracing::debug!("Saved classpath of {} to {}", project, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlecp_api::ClasspathEntry;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileClasspathStore::new(dir.path().join("store"));
        assert_eq!(store.current_classpath(&ProjectId::from("p")).unwrap(), None);
    }

    #[test]
    fn test_replace_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileClasspathStore::new(dir.path().join("store"));
        let project = ProjectId::from("p");
        let snapshot = ClasspathSnapshot::from_entries([
            ClasspathEntry::library("/ws/p/A.jar")
                .exported(true)
                .with_attribute(ClasspathEntry::ATTR_TEST, "true")
                .derived(),
            ClasspathEntry::source("src"),
        ]);

        store.replace_classpath(&project, &snapshot).unwrap();
        assert!(store.path_for(&project).is_file());
        assert_eq!(store.current_classpath(&project).unwrap(), Some(snapshot));

        // no temp files left behind
        let files = std::fs::read_dir(store.dir()).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn test_corrupt_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileClasspathStore::new(dir.path());
        let project = ProjectId::from("p");
        std::fs::write(store.path_for(&project), "not json").unwrap();

        let err = store.current_classpath(&project).unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[test]
    fn test_project_names_are_flattened() {
        let store = FileClasspathStore::new("/store");
        assert_eq!(
            store.path_for(&ProjectId::from("group/p")),
            PathBuf::from("/store/group_p.classpath.json")
        );
    }
}
