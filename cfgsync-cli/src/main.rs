use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod prompt;

use commands::{diff, install, log, pull, push, run, status};

#[derive(Parser)]
#[command(name = "cfgsync")]
#[command(version, about = "Mirror editor settings against a git remote", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/cfgsync/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for local and remote drift until interrupted
    Run {
        /// Skip the remote check on the first iteration
        #[arg(long)]
        skip_first_remote_check: bool,
    },

    /// Clone the remote and link the editor's files into it
    Install {
        /// Git URL of the settings repository
        #[arg(short, long)]
        remote: String,

        /// Also write a per-user service that starts `cfgsync run` at login
        #[arg(long)]
        register_service: bool,
    },

    /// Show the state of the mirror and each tracked file
    Status,

    /// Push local changes to the remote
    Push {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Pull remote changes into the editor
    Pull {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show local and incoming differences
    Diff,

    /// Show recent sync activity
    Log {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cfgsync=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            skip_first_remote_check,
        } => {
            run::run(config, skip_first_remote_check).await?;
        }
        Commands::Install {
            remote,
            register_service,
        } => {
            install::run(config, cli.config, remote, register_service)?;
        }
        Commands::Status => {
            status::run(config)?;
        }
        Commands::Push { yes } => {
            push::run(config, yes)?;
        }
        Commands::Pull { yes } => {
            pull::run(config, yes)?;
        }
        Commands::Diff => {
            diff::run(config)?;
        }
        Commands::Log { limit } => {
            log::run(config, limit)?;
        }
    }

    Ok(())
}
