use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "hostpulse",
    about = "hostpulse — fleet-host service health auditor",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every configured endpoint and print the health report.
    ///
    /// The exit code reflects the overall verdict: 0 when every endpoint
    /// is healthy, 1 otherwise.
    Check {
        /// Path to the audit configuration file
        #[arg(short, long, default_value = "hostpulse.toml")]
        config: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Override the run-level timeout (e.g. "10s", "500ms")
        #[arg(short, long)]
        timeout: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hostpulse=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            config,
            format,
            timeout,
        } => commands::check::run(&config, &format, timeout.as_deref()).await,
    }
}
