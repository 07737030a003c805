//! Reconciles a freshly computed classpath with the persisted one.

use std::collections::HashMap;

use bundlecp_api::{
    BundleRegistry, ClasspathEntry, ClasspathSnapshot, EntryIdentity, EntryKind, EntryOverrides,
    ProjectManifest,
};
use tracing::debug;

use crate::classpath::environment::is_environment_container;

/// Tells entries the updater produces for a project apart from entries a
/// user added by hand.
///
/// An entry is derived when it is marked so, is the execution environment
/// container, or sits where a registry bundle or one of the project's own
/// libraries would put it. Unmarked snapshots written by other tools are
/// classified by the last rule alone.
pub struct DerivedEntries<'a> {
    registry: &'a dyn BundleRegistry,
    manifest: &'a ProjectManifest,
}

impl<'a> DerivedEntries<'a> {
    pub fn new(registry: &'a dyn BundleRegistry, manifest: &'a ProjectManifest) -> Self {
        Self { registry, manifest }
    }

    pub fn contains(&self, entry: &ClasspathEntry) -> bool {
        if entry.derived || is_environment_container(entry) {
            return true;
        }
        match entry.kind {
            EntryKind::Library => {
                self.is_project_library(entry) || self.registry.bundle_at(&entry.path).is_some()
            }
            EntryKind::Project => self.registry.bundle_at(&entry.path).is_some(),
            _ => false,
        }
    }

    fn is_project_library(&self, entry: &ClasspathEntry) -> bool {
        self.manifest
            .libraries
            .iter()
            .any(|library| self.manifest.root.join(library) == entry.path)
    }
}

pub struct AttributeMerger;

impl AttributeMerger {
    /// Merges `computed` into `previous`.
    ///
    /// Computed entries keep their order. One that was already present
    /// carries over the persisted attributes, exported flag and source
    /// attachment; `overrides` then win over both. Derived entries that are
    /// no longer computed are dropped. Entries added by hand are kept after
    /// the computed ones, in their previous order, with `overrides` applied.
    pub fn merge(
        computed: &ClasspathSnapshot,
        previous: &ClasspathSnapshot,
        overrides: &EntryOverrides,
        derived: &DerivedEntries<'_>,
    ) -> ClasspathSnapshot {
        let prior: HashMap<EntryIdentity, &ClasspathEntry> =
            previous.iter().map(|e| (e.identity(), e)).collect();

        let mut merged = ClasspathSnapshot::empty();
        for fresh in computed {
            let entry = match prior.get(&fresh.identity()) {
                Some(old) => Self::carry_forward(fresh, old, overrides),
                None => {
                    let mut entry = fresh.clone();
                    overrides.apply(&mut entry);
                    entry
                }
            };
            merged.push(entry);
        }

        let mut dropped = 0usize;
        for old in previous {
            if merged.contains(&old.identity()) {
                continue;
            }
            if derived.contains(old) {
                dropped += 1;
                continue;
            }
            let mut kept = old.clone();
            overrides.apply(&mut kept);
            merged.push(kept);
        }

        if dropped > 0 {
            debug!(dropped, "Dropped entries no longer derived from dependencies");
        }
        merged
    }

    fn carry_forward(
        fresh: &ClasspathEntry,
        old: &ClasspathEntry,
        overrides: &EntryOverrides,
    ) -> ClasspathEntry {
        let mut entry = ClasspathEntry {
            kind: fresh.kind,
            path: fresh.path.clone(),
            source_attachment: old
                .source_attachment
                .clone()
                .or_else(|| fresh.source_attachment.clone()),
            exported: old.exported,
            attributes: old.attributes.clone(),
            access_rules: fresh.access_rules.clone(),
            derived: fresh.derived,
        };
        overrides.apply(&mut entry);
        entry
    }
}
