use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod error;
mod launch;
mod params;
mod render;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "stool")]
#[command(about = "Render and submit Slurm jobs from key=value parameters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the job script under the job directory and submit it.
    Launch(JobArgs),

    /// Print the job script without writing or submitting anything.
    Render(JobArgs),

    /// Print the built-in default parameters as JSON.
    Defaults,
}

#[derive(Args)]
struct JobArgs {
    /// JSON file of overrides, applied before the KEY=VALUE tokens.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides such as `walltime=02:00:00 nodes=2 conda_env=torch`.
    #[arg(value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

impl JobArgs {
    /// Defaults < config file < command line.
    fn resolve(&self) -> Result<params::JobSpec> {
        let mut overrides = params::Overrides::new();
        if let Some(path) = &self.config {
            overrides.extend(params::load_config_file(path)?);
        }
        overrides.extend(params::parse_cli_tokens(self.overrides.as_slice())?);

        if overrides.is_empty() {
            tracing::warn!("no overrides given, using built-in defaults");
        }
        let spec = params::resolve(params::JobSpec::default(), &overrides)
            .context("resolve job parameters")?;
        tracing::debug!(overrides = overrides.len(), ?spec, "resolved job parameters");
        Ok(spec)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stool=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Launch(args) => {
            let spec = args.resolve()?;
            let out = launch::materialize(&spec, &launch::CommandLauncher)
                .with_context(|| format!("launch job {}", spec.job_name))?;
            tracing::debug!(
                script = %out.script_path.display(),
                record = %out.record_path.display(),
                bytes = out.script.len(),
                "job materialized"
            );
        }
        Commands::Render(args) => {
            let spec = args.resolve()?;
            let script = launch::preview(&spec)
                .with_context(|| format!("render job {}", spec.job_name))?;
            print!("{}", script);
        }
        Commands::Defaults => {
            let json = serde_json::to_string_pretty(&params::JobSpec::default())?;
            println!("{}", json);
        }
    }

    Ok(())
}
