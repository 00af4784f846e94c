//! autocast-queue - Inspect the post queue and fire triggers by hand
//!
//! Unix-style companion to autocast-send: read-only views of the queue plus
//! one-shot versions of the generation and posting triggers.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use libautocast::logging::LoggingConfig;
use libautocast::store::QueueStats;
use libautocast::{AutocastError, Config, ContentScheduler, Post, PostOutcome, PostStatus, QueueStore};

#[derive(Parser, Debug)]
#[command(name = "autocast-queue")]
#[command(version)]
#[command(about = "Inspect the post queue and fire triggers by hand")]
#[command(long_about = "\
autocast-queue - Inspect the post queue and fire triggers by hand

COMMANDS:
    list        List queued posts in queue order
    stats       Count drafts and posted entries per platform
    generate    Run the weekly generation trigger now
    post        Run a posting trigger now (publishes the first draft)

USAGE EXAMPLES:
    # List all drafts
    autocast-queue list --status draft

    # Machine-readable queue
    autocast-queue list --format json

    # Publish the next draft right away
    autocast-queue post

CONFIGURATION:
    Configuration file: ~/.config/autocast/config.toml
    Queue location:     ~/.local/share/autocast/queue.json

    Override with environment variables:
        AUTOCAST_CONFIG       - Path to config file
        AUTOCAST_QUEUE_PATH   - Path to queue file

EXIT CODES:
    0 - Success
    1 - Operation failed (including a rejected publish)
    2 - Configuration error
    3 - Invalid input
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    #[arg(help = "Enable verbose logging to stderr (useful for debugging)")]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List queued posts
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only show posts with this status (draft or posted)
        #[arg(short, long)]
        status: Option<PostStatus>,

        /// Only show posts for this platform
        #[arg(short, long)]
        platform: Option<String>,
    },

    /// Show queue statistics
    Stats {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate and queue this week's drafts now
    Generate,

    /// Publish the first draft now
    Post {
        /// Intended platform, as a posting trigger would pass it
        #[arg(short, long)]
        platform: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libautocast::config::load_dotenv();
    LoggingConfig::from_env("warn", cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<AutocastError>()
            .map(AutocastError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::List {
            format,
            status,
            platform,
        } => {
            let store = QueueStore::open(config.queue_path()?);
            cmd_list(&store, format, status, platform.as_deref())
        }
        Commands::Stats { format } => {
            let store = QueueStore::open(config.queue_path()?);
            cmd_stats(&store, format)
        }
        Commands::Generate => {
            let scheduler = ContentScheduler::from_config(&config)?;
            let added = scheduler.generate_weekly_content().await?;
            println!("Queued {} draft(s)", added);
            Ok(())
        }
        Commands::Post { platform } => {
            let scheduler = ContentScheduler::from_config(&config)?;
            cmd_post(&scheduler, platform.as_deref()).await
        }
    }
}

fn cmd_list(
    store: &QueueStore,
    format: OutputFormat,
    status: Option<PostStatus>,
    platform: Option<&str>,
) -> anyhow::Result<()> {
    let mut posts = store.load()?;
    posts.retain(|p| {
        status.map_or(true, |s| p.status == s) && platform.map_or(true, |name| p.platform == name)
    });

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&posts).context("serializing queue")?;
            println!("{}", json);
        }
        OutputFormat::Text => output_list_text(&posts),
    }
    Ok(())
}

fn output_list_text(posts: &[Post]) {
    for post in posts {
        let when = post
            .posted_at
            .unwrap_or(post.created_at)
            .format("%Y-%m-%d %H:%M");
        println!(
            "{} | {} | {} | {} | {}",
            post.id,
            post.status,
            post.platform,
            when,
            truncate_content(&post.content, 50)
        );
    }
}

/// Truncate content to `max_chars` characters with an ellipsis, on one line
fn truncate_content(content: &str, max_chars: usize) -> String {
    let single_line = content.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let head: String = single_line.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

fn cmd_stats(store: &QueueStore, format: OutputFormat) -> anyhow::Result<()> {
    let stats = store.stats()?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&stats).context("serializing stats")?;
            println!("{}", json);
        }
        OutputFormat::Text => output_stats_text(&stats),
    }
    Ok(())
}

fn output_stats_text(stats: &QueueStats) {
    println!("Total:  {}", stats.total);
    println!("Drafts: {}", stats.drafts);
    println!("Posted: {}", stats.posted);
    for (platform, counts) in &stats.by_platform {
        println!(
            "  {}: {} draft(s), {} posted",
            platform, counts.drafts, counts.posted
        );
    }
}

async fn cmd_post(scheduler: &ContentScheduler, platform: Option<&str>) -> anyhow::Result<()> {
    match scheduler.post_next(platform).await? {
        PostOutcome::Posted(post) => {
            println!("Posted {} to {}", post.id, post.platform);
            Ok(())
        }
        PostOutcome::Failed(post) => {
            anyhow::bail!("publishing {} to {} failed; it stays a draft", post.id, post.platform)
        }
        PostOutcome::QueueEmpty => {
            println!("No drafts to post");
            Ok(())
        }
    }
}
