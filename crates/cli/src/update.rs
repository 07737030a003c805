use bundlecp_api::UpdateRequest;
use bundlecp_core::UpdaterConfig;
use bundlecp_core::runtime::ProjectStatus;
use bundlecp_runtime::Workspace;
use clap::Args;
use tracing::info;

use crate::overrides;

#[derive(Args)]
pub struct UpdateArgs {
    /// Projects to update
    #[arg(value_name = "PROJECT", required_unless_present = "all")]
    pub projects: Vec<String>,

    /// Update every project of the workspace
    #[arg(long)]
    pub all: bool,

    /// Ignore the persisted classpath and rebuild from scratch
    #[arg(long)]
    pub full_rebuild: bool,

    /// Source attachment override, KEY=PATH (KEY is a path or file name)
    #[arg(long = "source", value_name = "KEY=PATH")]
    pub sources: Vec<String>,

    /// Export override, KEY=true|false
    #[arg(long = "export", value_name = "KEY=BOOL")]
    pub exports: Vec<String>,

    /// Attribute override, KEY:NAME=VALUE; an empty VALUE removes it
    #[arg(long = "attribute", value_name = "KEY:NAME=VALUE")]
    pub attributes: Vec<String>,

    /// Print the final status as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(workspace: &Workspace, args: UpdateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let overrides = overrides::parse(&args.sources, &args.exports, &args.attributes)?;

    let projects = if args.all {
        workspace.models.projects()
    } else {
        args.projects.into_iter().map(Into::into).collect()
    };
    let mut request = UpdateRequest::new(projects).with_overrides(overrides);
    if args.full_rebuild {
        request = request.full_rebuild();
    }

    let scheduler =
        bundlecp_runtime::build_default_scheduler(workspace, UpdaterConfig::from_env())?;
    info!("Updating {} project(s)...", request.projects.len());
    let status = scheduler.schedule(request).join().await;
    scheduler.shutdown().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        for (project, project_status) in &status.projects {
            match project_status {
                ProjectStatus::Ok(report) => {
                    let change = if report.changed { "updated" } else { "unchanged" };
                    println!("{}: {} ({} entries)", project, change, report.entries);
                    for warning in &report.warnings {
                        println!("  warning: {}", warning);
                    }
                }
                ProjectStatus::Failed { cause } => println!("{}: failed: {}", project, cause),
                ProjectStatus::Cancelled => println!("{}: cancelled", project),
            }
        }
    }

    match status.cause() {
        Some(cause) => Err(cause.into()),
        None => Ok(()),
    }
}
