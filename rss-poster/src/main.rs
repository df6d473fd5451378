use anyhow::Context;
use clap::Parser;
use rss_poster::{
    ContentComposer, Config, CredentialChain, FeedPool, OAuth1Signer, PostHistory, PostingPipeline, Publisher,
    RssFeedSource, RunOutcome, RunSettings, TwitterApi, XaiChat,
};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "rss-poster", about = "Post one fresh article from a set of RSS feeds")]
struct Args {
    /// Configuration file (TOML). Defaults apply when absent.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Feed list, one URL per line.
    #[arg(long, default_value = "rss")]
    feeds: PathBuf,

    /// Posting history.
    #[arg(long, default_value = "posted_articles.json")]
    history: PathBuf,

    /// Secrets file (TOML). The environment is used when absent.
    #[arg(long, default_value = "secrets.toml")]
    secrets: PathBuf,

    #[arg(long, default_value = "rss_poster.log")]
    log_file: PathBuf,

    /// Compose content and print it without publishing or recording.
    #[arg(long)]
    dry_run: bool,
}

fn init_logging(level: &str, log_file: &Path) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config);
    let level = config.as_ref().map(|c| c.log_level.as_str()).unwrap_or("info");
    init_logging(level, &args.log_file)?;

    let config = config.context("Failed to load configuration")?;
    info!("Starting RSS Poster");

    // Everything that can fail without touching the network goes first
    let credentials = CredentialChain::standard(&args.secrets)
        .resolve()
        .context("Failed to resolve credentials")?;
    let feeds = FeedPool::load(&args.feeds)
        .with_context(|| format!("Failed to load feed list {}", args.feeds.display()))?;
    let history = Arc::new(
        PostHistory::load(&args.history)
            .with_context(|| format!("Failed to load history {}", args.history.display()))?,
    );
    info!(
        "Loaded {} feeds and {} history entries from {}",
        feeds.len(),
        history.len().await,
        history.path().display()
    );

    let source = Arc::new(RssFeedSource::from_config(&config)?);
    let llm = Arc::new(XaiChat::new(&credentials.xai_api_key, &config.llm, config.retry_policy())?);
    let api = Arc::new(TwitterApi::new(OAuth1Signer::from_credentials(&credentials), &config.platform)?);

    let composer = ContentComposer::new(llm, &config);
    let publisher = Publisher::from_config(api, &config);

    let mut settings = RunSettings::from(&config);
    settings.dry_run = args.dry_run;
    if settings.dry_run {
        warn!("Dry run: nothing will be posted or recorded");
    }

    let pipeline = PostingPipeline::new(feeds, source, composer, publisher, history, settings);

    match pipeline.run().await {
        Ok(RunOutcome::Posted { article_hash, title, post_ids }) => {
            info!("Posted '{}' ({}) as {} unit(s): {:?}", title, article_hash, post_ids.len(), post_ids);
        }
        Ok(RunOutcome::Previewed { title, post }) => {
            info!("Dry run composed {} unit(s) for '{}'", post.unit_count(), title);
        }
        Ok(RunOutcome::Exhausted) => {
            info!("Nothing to post this run");
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
