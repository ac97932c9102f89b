// ABOUTME: Entry point of the robodesk command line tool
// ABOUTME: Runs the API server, database migrations and the cron-triggered jobs

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use tracing_subscriber::EnvFilter;

use robodesk_cli::{run_server, services, Config};
use robodesk_core::Frequency;
use robodesk_notifications::JobSummary;

#[derive(Parser)]
#[command(name = "robodesk")]
#[command(about = "Robodesk - offer pipeline, document versions and sales notifications")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override ROBODESK_API_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create the database if needed and apply pending migrations
    Migrate,
    /// Email follow-up digests for overdue and upcoming leads
    Remind,
    /// Send periodic sales reports to enabled subscribers
    Report {
        #[arg(value_enum)]
        frequency: ReportFrequency,
        /// Send even if a subscriber was already served this period
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReportFrequency {
    Weekly,
    Monthly,
}

impl From<ReportFrequency> for Frequency {
    fn from(value: ReportFrequency) -> Self {
        match value {
            ReportFrequency::Weekly => Frequency::Weekly,
            ReportFrequency::Monthly => Frequency::Monthly,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;

    match command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            println!(
                "{} Starting Robodesk API on http://{}",
                "▶".green().bold(),
                config.bind_address()
            );
            run_server(&config).await
        }
        Commands::Migrate => {
            let pool = services::open_database(&config).await?;
            pool.close().await;
            println!(
                "{} Database ready at {}",
                "✓".green().bold(),
                config.database_path.display()
            );
            Ok(())
        }
        Commands::Remind => {
            let state = services::build_state(&config).await?;
            let summary = state.reminders.run().await?;
            print_summary(&summary);
            Ok(())
        }
        Commands::Report { frequency, force } => {
            let state = services::build_state(&config).await?;
            let summary = state.reports.run(frequency.into(), force).await?;
            print_summary(&summary);
            Ok(())
        }
    }
}

fn print_summary(summary: &JobSummary) {
    let marker = if summary.count > 0 {
        "✓".green().bold()
    } else {
        "–".yellow().bold()
    };
    println!("{} {}", marker, summary.message);
}
