mod config;
mod executors;
mod layout;
mod provision;
mod remote;
mod seeds;

use clap::{Parser, Subcommand};
use config::{ConfigErrors, JobConfig};
use executors::{ExecutorError, Executors};
use provision::ProvisionError;
use remote::Mode;
use std::{env, path::PathBuf, process::exit};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigErrors),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error("I/O failure")]
    Io(#[from] std::io::Error),
}

/// Distribute replicated runs across the robo nodes over SSH
#[derive(Parser, Debug)]
#[command(name = "robofleet-runner", version, about)]
struct Cli {
    /// path to the YAML job description
    #[arg(short, long, default_value = "job.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// provision replicate directories and start one detached run each
    Launch,
    /// terminate previously launched runs by executable name
    Kill,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(&cli) {
        error!("Job aborted: {error}");
        exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), RunnerError> {
    let config = JobConfig::load(&cli.config)?;

    if config.preflight_checks() {
        return Err(ConfigErrors::PreflightFailed.into());
    }

    let seeds = config.resolve_seeds()?;
    let mode = match cli.command {
        Command::Launch => Mode::Launch,
        Command::Kill => Mode::Kill,
    };

    // one prompt for the whole job, the secret is reused for every node and
    // never logged
    let secret = rpassword::prompt_password(format!("Password for {}: ", config.username))?;

    if mode == Mode::Launch {
        let base = env::current_dir()?;
        provision::provision(&config, &seeds, &base)?;
    }

    Executors::load(config, seeds, secret).execute(mode)?;
    info!("All nodes issued");

    Ok(())
}
