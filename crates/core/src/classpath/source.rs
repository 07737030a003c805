use std::path::{Path, PathBuf};

use bundlecp_api::BundleId;
use serde::{Deserialize, Serialize};

/// Naming rule that maps a binary to where its sources are expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceConvention {
    /// `lib/A.jar` -> `lib/Asrc.zip`
    SrcZip,
    /// `lib/A.jar` -> `lib/A-sources.jar`
    SourcesJar,
    /// `plugins/a_1.0.0.jar` -> `plugins/a.source_1.0.0.jar`
    SourceBundle,
}

impl SourceConvention {
    pub const DEFAULTS: [SourceConvention; 3] = [
        SourceConvention::SrcZip,
        SourceConvention::SourcesJar,
        SourceConvention::SourceBundle,
    ];

    /// Candidate source path for `binary`. Source bundles only exist for
    /// bundle binaries, so `bundle` must be given for them.
    pub fn candidate(&self, binary: &Path, bundle: Option<&BundleId>) -> Option<PathBuf> {
        let parent = binary.parent()?;
        match self {
            SourceConvention::SrcZip => {
                let stem = binary.file_stem()?.to_str()?;
                Some(parent.join(format!("{stem}src.zip")))
            }
            SourceConvention::SourcesJar => {
                let stem = binary.file_stem()?.to_str()?;
                Some(parent.join(format!("{stem}-sources.jar")))
            }
            SourceConvention::SourceBundle => {
                let id = bundle?;
                Some(parent.join(format!("{}.source_{}.jar", id.name, id.version)))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceLocator {
    conventions: Vec<SourceConvention>,
}

impl Default for SourceLocator {
    fn default() -> Self {
        Self::new(SourceConvention::DEFAULTS.to_vec())
    }
}

impl SourceLocator {
    pub fn new(conventions: Vec<SourceConvention>) -> Self {
        Self { conventions }
    }

    /// First convention candidate that exists on disk.
    pub fn locate(&self, binary: &Path, bundle: Option<&BundleId>) -> Option<PathBuf> {
        self.conventions
            .iter()
            .filter_map(|c| c.candidate(binary, bundle))
            .find(|candidate| candidate.is_file())
    }
}
