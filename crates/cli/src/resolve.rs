use bundlecp_api::{ProjectId, ProjectModelProvider};
use bundlecp_core::resolver::DependencyResolver;
use bundlecp_runtime::Workspace;
use tabled::{Table, settings::Style};

use crate::view::BundleView;

pub fn run(workspace: &Workspace, project: &str) -> Result<(), Box<dyn std::error::Error>> {
    let project = ProjectId::from(project);
    let manifest = workspace
        .models
        .manifest(&project)
        .ok_or_else(|| format!("Unknown project '{}'", project))?;

    let resolution = DependencyResolver::new(workspace.registry.as_ref()).resolve(&manifest);

    let rows: Vec<_> = resolution
        .bundles
        .iter()
        .map(BundleView::from_resolved)
        .collect();
    println!("{}", Table::new(&rows).with(Style::psql()));
    for warning in &resolution.warnings {
        println!("warning: {}", warning);
    }
    Ok(())
}
