use std::path::PathBuf;

use bundlecp_api::{
    AccessRule, AccessRuleKind, BundleDescriptor, BundleLocation, ClasspathEntry, ProjectManifest,
    ResolutionWarning,
};
use tracing::debug;

use super::access::access_rules;
use super::source::SourceLocator;
use crate::config::UpdaterConfig;

/// Entries contributed by one bundle, plus what went wrong building them.
#[derive(Debug, Default)]
pub struct BundleEntries {
    pub entries: Vec<ClasspathEntry>,
    pub warnings: Vec<ResolutionWarning>,
}

/// Makes classpath entries for bundles and project libraries, attaching
/// default sources and access rules.
#[derive(Debug, Clone)]
pub struct EntryFactory {
    sources: SourceLocator,
    access_fallback: Option<AccessRuleKind>,
}

impl EntryFactory {
    pub fn new(sources: SourceLocator, access_fallback: Option<AccessRuleKind>) -> Self {
        Self {
            sources,
            access_fallback,
        }
    }

    pub fn from_config(config: &UpdaterConfig) -> Self {
        Self::new(
            SourceLocator::new(config.source_conventions.clone()),
            config.access_rule_fallback,
        )
    }

    /// The bundle's own entry followed by the libraries embedded in a
    /// directory bundle.
    pub fn bundle_entries(&self, bundle: &BundleDescriptor, exported: bool) -> BundleEntries {
        let mut out = BundleEntries::default();
        let Some(location) = bundle.resolved_location() else {
            out.warnings.push(ResolutionWarning::UnresolvableLocation {
                bundle: bundle.id.clone(),
                location: bundle.location.clone(),
            });
            return out;
        };
        let rules = access_rules(bundle, self.access_fallback);

        let primary = match &location {
            BundleLocation::Project(name) => ClasspathEntry::project(format!("/{name}")),
            BundleLocation::Archive(path) | BundleLocation::Directory(path) => {
                let entry = ClasspathEntry::library(path.clone());
                match self.sources.locate(path, Some(&bundle.id)) {
                    Some(source) => entry.with_source(source),
                    None => entry,
                }
            }
        };
        out.entries.push(Self::finish(primary, exported, &rules));

        match &location {
            BundleLocation::Directory(dir) => {
                for library in bundle.libraries.iter().filter(|l| !is_bundle_root(l)) {
                    let path = dir.join(library);
                    if !path.exists() {
                        out.warnings.push(ResolutionWarning::MissingLibrary {
                            bundle: bundle.id.clone(),
                            path,
                        });
                        continue;
                    }
                    let entry = self.library(path);
                    out.entries.push(Self::finish(entry, exported, &rules));
                }
            }
            BundleLocation::Archive(_) if bundle.libraries.iter().any(|l| !is_bundle_root(l)) => {
                debug!(bundle = %bundle.id, "Nested libraries of archived bundle are not expanded");
            }
            _ => {}
        }
        out
    }

    /// Entry for one of the project's own libraries. Added even when the
    /// file does not exist yet.
    pub fn project_library(&self, manifest: &ProjectManifest, library: &str) -> ClasspathEntry {
        self.library(manifest.root.join(library))
            .exported(true)
            .derived()
    }

    fn library(&self, path: PathBuf) -> ClasspathEntry {
        let source = self.sources.locate(&path, None);
        let entry = ClasspathEntry::library(path);
        match source {
            Some(source) => entry.with_source(source),
            None => entry,
        }
    }

    fn finish(mut entry: ClasspathEntry, exported: bool, rules: &[AccessRule]) -> ClasspathEntry {
        entry.exported = exported;
        entry.access_rules = rules.to_vec();
        entry.derived = true;
        entry
    }
}

pub fn is_bundle_root(library: &str) -> bool {
    matches!(library.trim(), "" | "." | "./" | "/")
}
