use bundlecp_api::ClasspathEntry;
use bundlecp_core::resolver::ResolvedBundle;
use tabled::Tabled;

/// One classpath entry as a table row.
#[derive(Tabled)]
pub struct EntryView {
    pub kind: String,
    pub path: String,
    pub exported: String,
    pub source: String,
    pub attributes: String,
}

impl EntryView {
    pub fn from_entry(entry: &ClasspathEntry) -> Self {
        let attributes = if entry.attributes.is_empty() {
            "-".to_string()
        } else {
            entry
                .attributes
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",")
        };
        let marker = if entry.derived { "" } else { " (user)" };

        Self {
            kind: entry.kind.to_string(),
            path: format!("{}{}", entry.path.display(), marker),
            exported: if entry.exported { "yes" } else { "no" }.to_string(),
            source: entry
                .source_attachment
                .as_ref()
                .map(|s| s.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
            attributes,
        }
    }
}

#[derive(Tabled)]
pub struct BundleView {
    pub bundle: String,
    pub visibility: String,
    pub kind: String,
    pub location: String,
}

impl BundleView {
    pub fn from_resolved(resolved: &ResolvedBundle) -> Self {
        Self {
            bundle: resolved.id().to_string(),
            visibility: format!("{:?}", resolved.visibility).to_lowercase(),
            kind: format!("{:?}", resolved.kind),
            location: resolved.descriptor.location.clone(),
        }
    }
}
