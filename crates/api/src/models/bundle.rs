use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ApiError;

/// OSGi-style version: `major.minor.micro.qualifier`.
///
/// Missing numeric segments default to zero, so `1.2` equals `1.2.0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    pub qualifier: String,
}

impl Version {
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }
}

impl FromStr for Version {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Version::default());
        }

        let mut parts = trimmed.splitn(4, '.');
        let mut numbers = [0u32; 3];
        for slot in numbers.iter_mut() {
            match parts.next() {
                Some(part) => {
                    *slot = part.parse().map_err(|_| {
                        ApiError::InvalidArgument(format!("invalid version segment '{part}' in '{s}'"))
                    })?;
                }
                None => break,
            }
        }
        let qualifier = parts.next().unwrap_or_default().to_string();

        Ok(Version {
            major: numbers[0],
            minor: numbers[1],
            micro: numbers[2],
            qualifier,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.micro)
            .cmp(&(other.major, other.minor, other.micro))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Symbolic identity of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BundleId {
    pub name: String,
    #[serde(default)]
    pub version: Version,
}

impl BundleId {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.version)
    }
}

/// Lookup key handed to a [`crate::BundleRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BundleRequirement {
    pub name: String,
    pub min_version: Option<Version>,
}

impl BundleRequirement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_version: None,
        }
    }

    pub fn at_least(mut self, version: Version) -> Self {
        self.min_version = Some(version);
        self
    }

    pub fn matches(&self, id: &BundleId) -> bool {
        id.name == self.name
            && self
                .min_version
                .as_ref()
                .is_none_or(|min| &id.version >= min)
    }
}

/// How far a dependency's own dependencies are exposed to the dependent.
///
/// Variants are declared lowest first so `Ord` ranks `Reexport` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Optional,
    Private,
    Reexport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionState {
    #[default]
    Resolved,
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    #[default]
    RequireBundle,
    ImportPackage,
    FragmentHost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<Version>,
    #[serde(default)]
    pub kind: DependencyKind,
    pub visibility: Visibility,
    #[serde(default)]
    pub state: ResolutionState,
}

impl Dependency {
    pub fn new(target: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            target: target.into(),
            min_version: None,
            kind: DependencyKind::RequireBundle,
            visibility,
            state: ResolutionState::Resolved,
        }
    }

    pub fn reexport(target: impl Into<String>) -> Self {
        Self::new(target, Visibility::Reexport)
    }

    pub fn private(target: impl Into<String>) -> Self {
        Self::new(target, Visibility::Private)
    }

    pub fn optional(target: impl Into<String>) -> Self {
        Self::new(target, Visibility::Optional)
    }

    pub fn with_kind(mut self, kind: DependencyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_state(mut self, state: ResolutionState) -> Self {
        self.state = state;
        self
    }

    pub fn at_least(mut self, version: Version) -> Self {
        self.min_version = Some(version);
        self
    }

    pub fn requirement(&self) -> BundleRequirement {
        BundleRequirement {
            name: self.target.clone(),
            min_version: self.min_version.clone(),
        }
    }
}

/// Where a bundle's binaries live once its install location is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BundleLocation {
    Archive(PathBuf),
    Directory(PathBuf),
    Project(String),
}

impl BundleLocation {
    pub const PROJECT_SCHEME: &'static str = "project:";

    /// Interprets an install location string.
    ///
    /// Accepts plain paths, `file:` URLs (optionally wrapped in `reference:`)
    /// and `project:<name>`. Returns `None` for anything that does not denote
    /// a local filesystem location.
    pub fn parse(location: &str) -> Option<Self> {
        let location = location.trim();
        if location.is_empty() {
            return None;
        }

        if let Some(name) = location.strip_prefix(Self::PROJECT_SCHEME) {
            let name = name.trim_start_matches('/');
            return (!name.is_empty()).then(|| Self::Project(name.to_string()));
        }

        let location = location.strip_prefix("reference:").unwrap_or(location);
        let path = if location.starts_with("file:") {
            url::Url::parse(location).ok()?.to_file_path().ok()?
        } else if location.contains("://") {
            return None;
        } else {
            PathBuf::from(location)
        };

        let is_archive = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jar") || e.eq_ignore_ascii_case("zip"));

        Some(if is_archive {
            Self::Archive(path)
        } else {
            Self::Directory(path)
        })
    }
}

/// Immutable registry snapshot of one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDescriptor {
    pub id: BundleId,
    pub location: String,
    #[serde(default)]
    pub libraries: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub exported_packages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_environment: Option<String>,
}

impl BundleDescriptor {
    pub fn new(id: BundleId, location: impl Into<String>) -> Self {
        Self {
            id,
            location: location.into(),
            libraries: Vec::new(),
            dependencies: Vec::new(),
            exported_packages: Vec::new(),
            execution_environment: None,
        }
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.libraries.push(library.into());
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_exported_package(mut self, package: impl Into<String>) -> Self {
        self.exported_packages.push(package.into());
        self
    }

    pub fn resolved_location(&self) -> Option<BundleLocation> {
        BundleLocation::parse(&self.location)
    }

    /// Whether a classpath entry at `path` comes from this bundle: its own
    /// location, a library embedded in its directory, or `/<name>` for a
    /// workspace project.
    pub fn provides_path(&self, path: &Path) -> bool {
        match self.resolved_location() {
            Some(BundleLocation::Archive(archive)) => archive == path,
            Some(BundleLocation::Directory(dir)) => {
                dir == path || self.libraries.iter().any(|l| dir.join(l) == path)
            }
            Some(BundleLocation::Project(name)) => Path::new("/").join(name) == path,
            None => false,
        }
    }
}
