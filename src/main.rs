mod config;
mod contacts;
mod mailer;
mod pipeline;
mod scrape;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ipo_reminder_core::ReminderError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ipo-reminder")]
#[command(about = "Email subscribers a calendar invite on the final application day of open share offerings")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape open offerings, dedupe against the ledger, send notifications
    Run {
        /// Send even if already recorded in the ledger (for testing)
        #[arg(long)]
        force_send: bool,

        /// Dev mode: single test recipient, no ledger reads or writes
        #[arg(long)]
        dev: bool,

        /// Write the last generated invite to data/last_invite.ics
        #[arg(long)]
        dump_ics: bool,

        /// Cover every offering type, not just IPO/FPO/Right Share
        #[arg(long)]
        all_types: bool,
    },
    /// Scrape open offerings and write them as JSON
    Scrape {
        /// Output file path
        #[arg(long, default_value = "open_offerings.json")]
        out: PathBuf,

        /// Cover every offering type, not just IPO/FPO/Right Share
        #[arg(long)]
        all_types: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            force_send,
            dev,
            dump_ics,
            all_types,
        } => {
            cmd_run(pipeline::RunFlags {
                force_send,
                dev_mode: dev,
                dump_invite: dump_ics,
                all_types,
            })
            .await
        }
        Commands::Scrape { out, all_types } => cmd_scrape(out, all_types).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Missing configuration is an operator problem, not a runtime
            // failure: report it plainly and exit 2.
            if matches!(
                err.downcast_ref::<ReminderError>(),
                Some(ReminderError::Config(_))
            ) {
                eprintln!("{err}");
                ExitCode::from(2)
            } else {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "ipo_reminder=debug,ipo_reminder_core=debug"
    } else {
        "ipo_reminder=warn,ipo_reminder_core=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

async fn cmd_run(flags: pipeline::RunFlags) -> Result<()> {
    // Configuration is resolved before any network or ledger activity.
    let config = config::Config::from_env()?;
    pipeline::run(&config, flags).await
}

async fn cmd_scrape(out: PathBuf, all_types: bool) -> Result<()> {
    let types = if all_types {
        scrape::ALL_TYPES
    } else {
        scrape::DEFAULT_TYPES
    };
    let offerings = scrape::fetch_open_offerings(types).await?;

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&out, serde_json::to_string_pretty(&offerings)?)?;

    println!("Found {} open offerings. Wrote {}.", offerings.len(), out.display());
    Ok(())
}
