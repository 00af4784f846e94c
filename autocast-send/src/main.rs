//! autocast-send - Background daemon for scheduled drafting and posting
//!
//! Checks the wall clock once per poll interval, runs the weekly generation
//! trigger and the daily posting triggers when they come due.

use clap::Parser;
use libautocast::logging::LoggingConfig;
use libautocast::scheduler::TriggerAction;
use libautocast::{AutocastError, Config, ContentScheduler, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "autocast-send")]
#[command(version)]
#[command(about = "Background daemon that drafts and publishes posts on a schedule")]
#[command(long_about = "\
autocast-send - Background daemon that drafts and publishes posts on a schedule

DESCRIPTION:
    autocast-send is a long-running daemon. Once a week it asks the
    generative API for post ideas, drafts each one and appends the drafts
    to the queue. At each daily posting time it publishes the first draft
    in the queue.

    A failed publish leaves the draft in place; the next posting time
    tries it again.

USAGE:
    # Run in foreground (logs to stderr)
    autocast-send

    # Check the clock every 30 seconds
    autocast-send --poll-interval 30

    # Enable verbose logging
    autocast-send --verbose

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current trigger)

CONFIGURATION:
    Configuration file: ~/.config/autocast/config.toml (or $AUTOCAST_CONFIG)
    Queue location:     ~/.local/share/autocast/queue.json (or $AUTOCAST_QUEUE_PATH)

    [scheduling]
    poll_interval = 60
    generation = { day = \"monday\", time = \"09:00\" }
    posting = [
        { time = \"09:00\", platform = \"twitter\" },
        { time = \"13:00\", platform = \"linkedin\" },
        { time = \"17:00\", platform = \"twitter\" },
    ]

CREDENTIALS (environment, or a .env file):
    ANTHROPIC_API_KEY, TWITTER_BEARER_TOKEN,
    LINKEDIN_ACCESS_TOKEN, LINKEDIN_AUTHOR_URN

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Configuration error
    3 - Invalid input
")]
struct Cli {
    /// Poll interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS")]
    #[arg(help = "How often to check the clock (default: 60)")]
    poll_interval: Option<u64>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    #[arg(help = "Enable verbose logging (useful for debugging)")]
    verbose: bool,

    /// Run once and exit (for testing)
    #[arg(long, hide = true)]
    #[arg(help = "Check triggers once against the current time and exit")]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libautocast::config::load_dotenv();
    LoggingConfig::from_env("info", cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let mut scheduler = ContentScheduler::from_config(&config)?;

    let poll_interval = cli
        .poll_interval
        .unwrap_or(config.scheduling.poll_interval);
    if poll_interval == 0 {
        return Err(AutocastError::InvalidInput(
            "Poll interval must be at least 1 second".to_string(),
        ));
    }

    info!("autocast-send starting");
    info!("Queue: {}", scheduler.store().path().display());
    info!("Poll interval: {}s", poll_interval);

    if cli.once {
        let fired = scheduler.tick(local_now()).await;
        info!("autocast-send: checked triggers once ({} fired), exiting", fired.len());
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    run_daemon_loop(&mut scheduler, poll_interval, shutdown).await;

    info!("autocast-send stopped");
    Ok(())
}

fn local_now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Set up signal handlers for graceful shutdown
#[cfg(unix)]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])
        .map_err(|e| AutocastError::InvalidInput(format!("Signal setup failed: {}", e)))?;

    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            info!("Received shutdown signal, stopping gracefully...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn setup_signal_handlers(_shutdown: Arc<AtomicBool>) -> Result<()> {
    Ok(())
}

fn describe(action: &TriggerAction) -> String {
    match action {
        TriggerAction::Generate => "weekly generation".to_string(),
        TriggerAction::Post { platform } => format!("posting ({})", platform),
    }
}

fn log_next_trigger(scheduler: &ContentScheduler) {
    let now = local_now();
    if let Some((at, action)) = scheduler.schedule().next_after(now) {
        let wait = (at - now).to_std().unwrap_or_default();
        info!(
            "Next trigger: {} at {} (in {})",
            describe(&action),
            at.format("%a %H:%M"),
            humantime::format_duration(Duration::from_secs(wait.as_secs()))
        );
    }
}

/// Main daemon loop
async fn run_daemon_loop(scheduler: &mut ContentScheduler, poll_interval: u64, shutdown: Arc<AtomicBool>) {
    log_next_trigger(scheduler);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested, stopping daemon loop");
            break;
        }

        let fired = scheduler.tick(local_now()).await;
        if !fired.is_empty() {
            log_next_trigger(scheduler);
        }

        // Sleep until next poll (check shutdown every second)
        for _ in 0..poll_interval {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            sleep(Duration::from_secs(1)).await;
        }
    }
}
