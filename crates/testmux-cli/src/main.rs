//! testmux CLI tool.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "testmux")]
#[command(about = "testmux job queue CLI", long_about = None)]
struct Cli {
    /// API server URL
    #[arg(long, env = "TESTMUX_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new test job
    Submit {
        /// Organization ID
        #[arg(long)]
        org_id: String,
        /// App version the test run is pinned to
        #[arg(long)]
        app_version_id: String,
        /// Path to the test file
        #[arg(long = "test")]
        test_path: String,
        /// Job priority tag
        #[arg(long, default_value = "normal")]
        priority: String,
        /// Worker capability the job requires
        #[arg(long, default_value = "emulator")]
        target: String,
    },
    /// Check the status of a submitted job
    Status {
        /// Job ID to look up
        #[arg(long)]
        job_id: String,
    },
    /// Poll a job until it reaches a terminal status
    Poll {
        /// Job ID to poll
        #[arg(long)]
        job_id: String,
        /// Seconds between polls
        #[arg(long, default_value = "3")]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            org_id,
            app_version_id,
            test_path,
            priority,
            target,
        } => {
            commands::jobs::submit(&cli.api_url, org_id, app_version_id, test_path, priority, target)
                .await?;
        }
        Commands::Status { job_id } => {
            commands::jobs::status(&cli.api_url, &job_id).await?;
        }
        Commands::Poll { job_id, interval } => {
            commands::jobs::poll(&cli.api_url, &job_id, interval).await?;
        }
    }

    Ok(())
}
