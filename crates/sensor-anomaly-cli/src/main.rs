//! sensor-anomaly entry point.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use sensor_anomaly::{DEFAULT_MODEL_SEED, DEFAULT_NOISE_SEED};
use sensor_anomaly_cli::config::{resolve_output_dir, RunSettings};

#[derive(Parser)]
#[command(
    name = "sensor-anomaly",
    about = "Generate synthetic environmental readings, flag anomalies, plot and export them",
    version
)]
struct Cli {
    /// Directory for the CSV outputs.
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Seed for the synthetic signal noise.
    #[arg(long, default_value_t = DEFAULT_NOISE_SEED)]
    noise_seed: u64,

    /// Seed for the isolation forest.
    #[arg(long, default_value_t = DEFAULT_MODEL_SEED)]
    model_seed: u64,

    /// Do not open the chart window.
    #[arg(long)]
    no_display: bool,

    /// Also write the chart as an image file (format from the extension).
    #[arg(long)]
    save_chart: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline (default).
    Run,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   sensor-anomaly completions bash > ~/.local/share/bash-completion/completions/sensor-anomaly
    ///   sensor-anomaly completions zsh > ~/.zfunc/_sensor-anomaly
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let settings = RunSettings {
                output_dir: resolve_output_dir(cli.output_dir.as_deref()),
                noise_seed: cli.noise_seed,
                model_seed: cli.model_seed,
                display: !cli.no_display,
                save_chart: cli.save_chart,
            };
            sensor_anomaly_cli::run(&settings)?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "sensor-anomaly", &mut std::io::stdout());
        }
    }

    Ok(())
}
