use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Library,
    Project,
    Variable,
    Container,
    Source,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryKind::Library => "lib",
            EntryKind::Project => "project",
            EntryKind::Variable => "var",
            EntryKind::Container => "con",
            EntryKind::Source => "src",
        };
        f.write_str(s)
    }
}

/// `(kind, path)`: what makes two entries "the same" regardless of their
/// user-editable content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryIdentity {
    pub kind: EntryKind,
    pub path: PathBuf,
}

impl fmt::Display for EntryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.path.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRuleKind {
    Accessible,
    Discouraged,
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessRule {
    pub kind: AccessRuleKind,
    pub pattern: String,
}

impl AccessRule {
    pub fn new(kind: AccessRuleKind, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClasspathEntry {
    pub kind: EntryKind,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_attachment: Option<PathBuf>,
    #[serde(default)]
    pub exported: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_rules: Vec<AccessRule>,
    /// Produced from the project's dependencies rather than added by hand.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub derived: bool,
}

impl ClasspathEntry {
    pub const ATTR_MODULE: &'static str = "module";
    pub const ATTR_TEST: &'static str = "test";
    pub const ATTR_IGNORE_OPTIONAL_PROBLEMS: &'static str = "ignore_optional_problems";

    pub fn new(kind: EntryKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            source_attachment: None,
            exported: false,
            attributes: BTreeMap::new(),
            access_rules: Vec::new(),
            derived: false,
        }
    }

    pub fn library(path: impl Into<PathBuf>) -> Self {
        Self::new(EntryKind::Library, path)
    }

    pub fn project(name: impl Into<PathBuf>) -> Self {
        Self::new(EntryKind::Project, name)
    }

    pub fn container(path: impl Into<PathBuf>) -> Self {
        Self::new(EntryKind::Container, path)
    }

    pub fn variable(path: impl Into<PathBuf>) -> Self {
        Self::new(EntryKind::Variable, path)
    }

    pub fn source(path: impl Into<PathBuf>) -> Self {
        Self::new(EntryKind::Source, path)
    }

    pub fn exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source_attachment = Some(source.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_access_rule(mut self, rule: AccessRule) -> Self {
        self.access_rules.push(rule);
        self
    }

    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    pub fn identity(&self) -> EntryIdentity {
        EntryIdentity {
            kind: self.kind,
            path: self.path.clone(),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Final path segment, used when matching override keys.
    pub fn last_segment(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Whether an override key refers to this entry: either its full path or
    /// its last path segment.
    pub fn matches_key(&self, key: &str) -> bool {
        Path::new(key) == self.path || self.last_segment() == Some(key)
    }
}

/// Ordered classpath of one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClasspathSnapshot {
    entries: Vec<ClasspathEntry>,
}

impl ClasspathSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot, keeping the first entry of every identity.
    pub fn from_entries(entries: impl IntoIterator<Item = ClasspathEntry>) -> Self {
        let mut snapshot = Self::empty();
        for entry in entries {
            snapshot.push(entry);
        }
        snapshot
    }

    /// Appends an entry unless its identity is already present. Returns
    /// whether it was added.
    pub fn push(&mut self, entry: ClasspathEntry) -> bool {
        if self.contains(&entry.identity()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn contains(&self, identity: &EntryIdentity) -> bool {
        self.find(identity).is_some()
    }

    pub fn find(&self, identity: &EntryIdentity) -> Option<&ClasspathEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == identity.kind && e.path == identity.path)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ClasspathEntry> {
        self.entries.iter().find(|e| e.last_segment() == Some(name))
    }

    pub fn entries(&self) -> &[ClasspathEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClasspathEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<ClasspathEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a ClasspathSnapshot {
    type Item = &'a ClasspathEntry;
    type IntoIter = std::slice::Iter<'a, ClasspathEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
