use bundlecp_runtime::Workspace;
use tracing::info;

pub fn run(workspace: &Workspace) -> Result<(), Box<dyn std::error::Error>> {
    let dir = workspace.store.dir();
    info!("Clearing persisted classpaths at: {}...", dir.display());
    let removed = bundlecp_runtime::clear_classpaths(dir)?;
    info!("Cleared {} classpaths.", removed);
    Ok(())
}
