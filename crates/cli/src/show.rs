use bundlecp_api::{ClasspathStore, ProjectId};
use bundlecp_runtime::Workspace;
use tabled::{Table, settings::Style};

use crate::view::EntryView;

pub fn run(
    workspace: &Workspace,
    project: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = ProjectId::from(project);

    let Some(classpath) = workspace.store.current_classpath(&project)? else {
        println!(
            "No classpath persisted for '{}'. Run `bundlecp update {}` first.",
            project, project
        );
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&classpath)?);
    } else {
        let rows: Vec<_> = classpath.iter().map(EntryView::from_entry).collect();
        println!("{}", Table::new(&rows).with(Style::psql()));
    }
    Ok(())
}
