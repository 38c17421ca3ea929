use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod cmd;

#[derive(Parser)]
#[command(name = "orgcompile")]
#[command(
    version,
    about = "Check-only recompilation of every Apex class and trigger in an org"
)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Org alias or username. Defaults to the CLI's default org.
    #[arg(long, global = true)]
    pub target_org: Option<String>,

    /// Platform CLI command. Overrides orgcompile.toml and SF_CMD.
    #[arg(long, global = true)]
    pub sf_cmd: Option<String>,

    /// Maximum member staging calls in flight at once
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Milliseconds between compile status reads
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile all classes and triggers (default)
    Compile,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default orgcompile.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    orgcompile::logging::init(cli.verbose)?;

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        None | Some(Commands::Compile) => {
            let outcome = cmd::cmd_compile(&cli, project_dir).await?;
            if outcome.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Some(Commands::Config { command }) => {
            cmd::cmd_config(&cli, project_dir, command.clone())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
