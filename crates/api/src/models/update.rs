use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use super::bundle::BundleId;
use super::classpath::ClasspathEntry;
use super::project::ProjectId;

/// Library key -> chosen source attachment.
pub type SourceAttachmentOverrideMap = BTreeMap<String, PathBuf>;

/// Library key -> exported flag.
pub type ExportOverrideMap = BTreeMap<String, bool>;

/// Library key -> attribute name -> new value, `None` removes the attribute.
pub type AttributeOverrideMap = BTreeMap<String, BTreeMap<String, Option<String>>>;

/// Explicit, per-update decisions that win over both the computed defaults
/// and the persisted classpath.
///
/// Keys match an entry by full path or by last path segment
/// (see [`ClasspathEntry::matches_key`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOverrides {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: SourceAttachmentOverrideMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exported: ExportOverrideMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: AttributeOverrideMap,
}

impl EntryOverrides {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.exported.is_empty() && self.attributes.is_empty()
    }

    pub fn with_source(mut self, key: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        self.sources.insert(key.into(), source.into());
        self
    }

    pub fn with_exported(mut self, key: impl Into<String>, exported: bool) -> Self {
        self.exported.insert(key.into(), exported);
        self
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        attribute: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        self.attributes
            .entry(key.into())
            .or_default()
            .insert(attribute.into(), value);
        self
    }

    /// Folds a newer set of overrides into this one; the newer value wins on
    /// every key conflict.
    pub fn absorb(&mut self, newer: EntryOverrides) {
        self.sources.extend(newer.sources);
        self.exported.extend(newer.exported);
        for (key, attrs) in newer.attributes {
            self.attributes.entry(key).or_default().extend(attrs);
        }
    }

    fn lookup<'a, V>(map: &'a BTreeMap<String, V>, entry: &ClasspathEntry) -> Option<&'a V> {
        let full = entry.path.to_string_lossy();
        map.get(full.as_ref())
            .or_else(|| entry.last_segment().and_then(|name| map.get(name)))
    }

    pub fn source_for(&self, entry: &ClasspathEntry) -> Option<&PathBuf> {
        Self::lookup(&self.sources, entry)
    }

    pub fn exported_for(&self, entry: &ClasspathEntry) -> Option<bool> {
        Self::lookup(&self.exported, entry).copied()
    }

    pub fn attributes_for(&self, entry: &ClasspathEntry) -> Option<&BTreeMap<String, Option<String>>> {
        Self::lookup(&self.attributes, entry)
    }

    /// Applies every override that targets `entry`.
    pub fn apply(&self, entry: &mut ClasspathEntry) {
        if let Some(source) = self.source_for(entry) {
            entry.source_attachment = Some(source.clone());
        }
        if let Some(exported) = self.exported_for(entry) {
            entry.exported = exported;
        }
        if let Some(attrs) = self.attributes_for(entry) {
            for (name, value) in attrs {
                match value {
                    Some(value) => {
                        entry.attributes.insert(name.clone(), value.clone());
                    }
                    None => {
                        entry.attributes.remove(name);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub projects: BTreeSet<ProjectId>,
    #[serde(default)]
    pub overrides: EntryOverrides,
    /// Ignore the persisted classpath and rebuild from scratch.
    #[serde(default)]
    pub full_rebuild: bool,
}

impl UpdateRequest {
    pub fn new(projects: impl IntoIterator<Item = impl Into<ProjectId>>) -> Self {
        Self {
            projects: projects.into_iter().map(Into::into).collect(),
            overrides: EntryOverrides::default(),
            full_rebuild: false,
        }
    }

    pub fn with_overrides(mut self, overrides: EntryOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn full_rebuild(mut self) -> Self {
        self.full_rebuild = true;
        self
    }
}

/// Non-fatal problem met while computing a classpath.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionWarning {
    #[error("unresolved dependency '{target}'")]
    UnresolvedDependency { target: String },
    #[error("bundle {bundle} is disabled")]
    DisabledBundle { bundle: BundleId },
    #[error("bundle {bundle} has unresolvable location '{location}'")]
    UnresolvableLocation { bundle: BundleId, location: String },
    #[error("library {path} of bundle {bundle} does not exist")]
    MissingLibrary { bundle: BundleId, path: PathBuf },
}

/// Outcome of one successful classpath update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub project: ProjectId,
    pub entries: usize,
    /// Persisted content differs from what was there before.
    pub changed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ResolutionWarning>,
}
