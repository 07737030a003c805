mod clear;
mod overrides;
mod resolve;
mod show;
mod update;
mod view;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bundlecp",
    version,
    about = "Computes and maintains the compile classpath of bundle projects",
    long_about = "bundlecp derives each project's classpath from its declared bundle dependencies \
                  and the bundles installed in the workspace, then merges it with the persisted \
                  classpath so hand-made customizations survive."
)]
pub struct Cli {
    /// Workspace description (installed bundles and project manifests), JSON
    #[arg(long, short, global = true, value_name = "FILE", default_value = "workspace.json")]
    pub workspace: PathBuf,

    /// Directory of persisted classpaths. Defaults to the workspace file's
    /// `store`, then ~/.bundlecp/classpaths
    #[arg(long, global = true, value_name = "DIR")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recompute and persist the classpath of one or more projects
    Update(update::UpdateArgs),
    /// Print a project's persisted classpath
    Show {
        #[arg(value_name = "PROJECT")]
        project: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print a project's resolved dependency closure without touching the store
    Resolve {
        #[arg(value_name = "PROJECT")]
        project: String,
    },
    /// Remove every persisted classpath
    Clear,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = bundlecp_runtime::init_logging("cli", true);

    let workspace = bundlecp_runtime::Workspace::load(&cli.workspace, cli.store)?;

    match cli.command {
        Commands::Update(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(update::run(&workspace, args))
        }
        Commands::Show { project, json } => show::run(&workspace, &project, json),
        Commands::Resolve { project } => resolve::run(&workspace, &project),
        Commands::Clear => clear::run(&workspace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_flags() {
        let cli = Cli::try_parse_from([
            "bundlecp",
            "--workspace",
            "ws.json",
            "update",
            "p",
            "q",
            "--full-rebuild",
            "--source",
            "A.jar=/src/A.zip",
            "--attribute",
            "A.jar:test=true",
        ])
        .unwrap();

        assert_eq!(cli.workspace, PathBuf::from("ws.json"));
        let Commands::Update(args) = cli.command else {
            panic!("expected update");
        };
        assert_eq!(args.projects, vec!["p".to_string(), "q".to_string()]);
        assert!(args.full_rebuild);
        assert_eq!(args.sources, vec!["A.jar=/src/A.zip".to_string()]);
    }

    #[test]
    fn test_update_needs_projects_or_all() {
        assert!(Cli::try_parse_from(["bundlecp", "update"]).is_err());
        assert!(Cli::try_parse_from(["bundlecp", "update", "--all"]).is_ok());
    }
}
