mod config;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use case_history_core::{
    utils::cancel::CancelHandle, CaseHistoryTracker, FetchMode, RunOutcome, RunRequest,
};
use config::{load_settings, Cli};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "case-history.log";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.debug);

    if let Err(e) = run(cli).await {
        tracing::error!(error = ?e, "run failed");
        eprintln!("Error: {e:#}");
        eprintln!("See {LOG_DIR}/{LOG_FILE}.* for details.");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.config.as_deref(), &cli)?;

    let profile_url = match &cli.profile_url {
        Some(url) => url.clone(),
        None => prompt("Enter your Steam profile URL: ")?,
    };
    let cookie = match &cli.cookie {
        Some(cookie) => cookie.clone(),
        None => prompt("Enter your Steam cookie: ")?,
    };

    let (handle, signal) = CancelHandle::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing with partial results");
            handle.cancel();
        }
    });

    let tracker = CaseHistoryTracker::new(settings, signal).context("Invalid settings")?;
    let request = RunRequest {
        profile_url,
        cookie,
        mode: if cli.full {
            FetchMode::Full
        } else {
            FetchMode::Incremental
        },
    };

    match tracker.run(&request).await? {
        RunOutcome::NoEvents => println!("No case opening events found."),
        RunOutcome::Completed(report) => {
            println!("{}", report.summary);
            println!("\nDetailed Case Opening Events:");
            for event in &report.events {
                println!("{event}");
            }
            match &report.saved {
                Some(files) => println!("\nResults saved to {}", files.report.display()),
                None => println!("\nResults could not be saved, see the log for details."),
            }
        }
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn setup_logging(debug: bool) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("case_history=debug,case_history_core=debug")
        } else {
            EnvFilter::new("case_history=info,case_history_core=info")
        }
    });

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    guard
}
