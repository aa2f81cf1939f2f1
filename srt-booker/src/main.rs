use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::sync::oneshot;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use srt_booker::booking::{Booker, ReservationOutcome, RouteReport};
use srt_booker::config::{PollConfig, SessionConfig, load_routes};
use srt_booker::error::RunError;
use srt_booker::session::{Credentials, IDENTITY_ENV, SECRET_ENV};
use srt_booker::site::{BrowserConfig, connect};

/// Book SRT seats by polling the reservation site.
///
/// Reads the member id and password from the environment.
#[derive(Parser, Debug)]
#[command(name = "srt-booker", version, about, after_help = env_help())]
struct Cli {
    /// Route file with one [[route]] table per trip
    #[arg(long)]
    routes: PathBuf,

    /// WebDriver (chromedriver) endpoint
    #[arg(long, default_value = "http://localhost:9515")]
    webdriver: String,

    /// Run Chrome without a window
    #[arg(long)]
    headless: bool,

    /// Close the browser straight after booking instead of waiting for Enter
    #[arg(long)]
    no_wait: bool,
}

fn env_help() -> String {
    format!("Environment:\n  {IDENTITY_ENV}        member id\n  {SECRET_ENV}  password")
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<(), RunError> {
    // Fail on a bad route file or missing credentials before starting Chrome
    let routes = load_routes(&cli.routes)?;
    let credentials = Credentials::from_env()?;

    let browser = BrowserConfig::new()
        .with_webdriver_url(&cli.webdriver)
        .with_headless(cli.headless);
    let site = connect(&browser).await?;

    let session = SessionConfig::default();
    let poll = PollConfig::default();
    let run = Booker::new(&site, &session, &poll)
        .run(&credentials, &routes, interrupted())
        .await;

    // A claimed seat waits for payment even when a later route failed
    print_summary(&run.reports);
    if !cli.no_wait && run.any_reserved() {
        wait_for_operator().await;
    }

    if let Err(e) = site.close().await {
        warn!(error = %e, "failed to close browser");
    }

    run.error.map_or(Ok(()), Err)
}

/// Completes on Ctrl-C. Never completes if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn print_summary(reports: &[RouteReport]) {
    if reports.is_empty() {
        return;
    }
    println!();
    for report in reports {
        match &report.outcome {
            ReservationOutcome::Success(train) => println!(
                "Reserved: {} at {} (attempt {})",
                report.criteria, train.departure, train.attempts
            ),
            ReservationOutcome::Exhausted => println!("Not reserved: {}", report.criteria),
        }
    }
}

async fn wait_for_operator() {
    println!();
    println!("Finish payment in the browser, then press Enter to close it.");

    // Blocking read on its own thread so Ctrl-C can still end the wait;
    // the Ctrl-C handler is installed by now and no longer kills the process
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = tx.send(std::io::stdin().read_line(&mut line));
    });

    tokio::select! {
        read = rx => {
            if let Ok(Err(e)) = read {
                warn!(error = %e, "could not read from stdin");
            }
        }
        () = interrupted() => {}
    }
}
