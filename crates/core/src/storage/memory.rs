use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bundlecp_api::{ClasspathSnapshot, ClasspathStore, ProjectId, StoreError, StoreResult};
use dashmap::DashMap;

/// Keeps one snapshot per project; a replace swaps the whole `Arc`.
#[derive(Default)]
pub struct MemoryClasspathStore {
    snapshots: DashMap<ProjectId, Arc<ClasspathSnapshot>>,
    writes: AtomicUsize,
    read_only: AtomicBool,
}

impl MemoryClasspathStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a project's classpath without counting it as a write.
    pub fn insert(&self, project: impl Into<ProjectId>, snapshot: ClasspathSnapshot) {
        self.snapshots.insert(project.into(), Arc::new(snapshot));
    }

    pub fn snapshot(&self, project: &ProjectId) -> Option<Arc<ClasspathSnapshot>> {
        self.snapshots.get(project).map(|s| Arc::clone(s.value()))
    }

    /// Successful replaces so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// While read-only every replace is rejected.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Relaxed);
    }
}

impl ClasspathStore for MemoryClasspathStore {
    fn current_classpath(&self, project: &ProjectId) -> StoreResult<Option<ClasspathSnapshot>> {
        Ok(self.snapshot(project).map(|s| (*s).clone()))
    }

    fn replace_classpath(&self, project: &ProjectId, snapshot: &ClasspathSnapshot) -> StoreResult<()> {
        if self.read_only.load(Ordering::Relaxed) {
            return Err(StoreError::Write {
                project: project.to_string(),
                reason: "store is read-only".to_string(),
            });
        }
        self.snapshots
            .insert(project.clone(), Arc::new(snapshot.clone()));
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlecp_api::ClasspathEntry;

    #[test]
    fn test_replace_swaps_whole_snapshot() {
        let store = MemoryClasspathStore::new();
        let project = ProjectId::from("p");
        store.insert("p", ClasspathSnapshot::from_entries([ClasspathEntry::source("src")]));
        let before = store.snapshot(&project).unwrap();

        let next = ClasspathSnapshot::from_entries([ClasspathEntry::library("/a.jar")]);
        store.replace_classpath(&project, &next).unwrap();

        // readers holding the old Arc keep a consistent view
        assert_eq!(before.len(), 1);
        assert_eq!(before.entries()[0].path.to_str(), Some("src"));
        assert_eq!(store.current_classpath(&project).unwrap(), Some(next));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let store = MemoryClasspathStore::new();
        store.set_read_only(true);
        let err = store
            .replace_classpath(&ProjectId::from("p"), &ClasspathSnapshot::empty())
            .unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(store.current_classpath(&ProjectId::from("p")).unwrap(), None);
        assert_eq!(store.writes(), 0);
    }
}
