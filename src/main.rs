mod ado;
mod builds;
mod changes;
mod config;
mod output;
mod tools;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

/// ado-pr-tools — read-only Azure DevOps pull request tools for AI coding
/// assistants, served over MCP on stdio or run once from the command line.
#[derive(Parser, Debug)]
#[command(name = "ado-pr-tools", version, about)]
struct Cli {
    /// Config file (default: .ado-pr-tools.toml in the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write the JSON result to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server on stdio (default)
    Serve,
    /// Print error lines from the latest build of a pull request
    BuildErrors {
        /// Pull request ID
        pull_request_id: u64,
    },
    /// Print a pull request's changed files and suggested git commands
    Changes {
        /// Pull request ID
        pull_request_id: u64,
        /// Repository (default: configured repository)
        #[arg(short, long)]
        repository: Option<String>,
    },
    /// Print active pull requests for a source branch
    PullRequests {
        /// Source branch, without refs/heads/
        branch: String,
        /// Repository (default: configured repository)
        #[arg(short, long)]
        repository: Option<String>,
    },
    /// Print the comments of a pull request
    Comments {
        /// Pull request ID
        pull_request_id: u64,
        /// Repository (default: configured repository)
        #[arg(short, long)]
        repository: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let settings = config::Config::load(cli.config.as_deref())?.settings()?;
    debug!(organization = %settings.organization, project = %settings.project, build_match = ?settings.build_match, "configuration validated");

    let command = cli.command.unwrap_or(Command::Serve);
    let _main_span = info_span!("ado_pr_tools", command = ?command).entered();

    let json = match command {
        Command::Serve => return tools::serve(settings).await,
        Command::BuildErrors { pull_request_id } => {
            let client = ado::AdoClient::new(&settings)?;
            tools::build_errors(&client, pull_request_id, settings.build_match).await?
        }
        Command::Changes {
            pull_request_id,
            repository,
        } => {
            let repository = settings.resolve_repository(repository.as_deref())?;
            let client = ado::AdoClient::new(&settings)?;
            tools::pull_request_changes(&client, &repository, pull_request_id).await?
        }
        Command::PullRequests { branch, repository } => {
            let repository = settings.resolve_repository(repository.as_deref())?;
            let client = ado::AdoClient::new(&settings)?;
            tools::list_pull_requests(&client, &repository, &branch).await?
        }
        Command::Comments {
            pull_request_id,
            repository,
        } => {
            let repository = settings.resolve_repository(repository.as_deref())?;
            let client = ado::AdoClient::new(&settings)?;
            tools::pull_request_comments(&client, &repository, pull_request_id).await?
        }
    };

    output::output(&json, cli.output.as_deref())?;
    info!("done");

    Ok(())
}
