//! Notice relay CLI
//!
//! Polls the notice listing and relays new announcements to a Discord webhook.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use notice_relay::{
    error::Result,
    models::{
        Config, ENV_CHECK_INTERVAL, ENV_SKIP_INITIAL, ENV_WEBHOOK_URL, WEBHOOK_PLACEHOLDER,
    },
    pipeline::{self, WatchOptions, Watcher, fresh_announcements},
    services::{AnnouncementExtractor, AnnouncementSource, NoticeBoard, WebhookNotifier},
    storage::{LocalSeenStore, SeenStore},
    utils::http,
};

/// notice-relay - MapleStory notice relay
#[derive(Parser, Debug)]
#[command(
    name = "notice-relay",
    version,
    about = "Relays new MapleStory notices to a Discord webhook"
)]
struct Cli {
    /// Directory holding config.toml and the seen-set file
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Environment file to load before reading variables
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the listing and relay new announcements (default)
    Run,

    /// Fetch the listing once and show what is new, without notifying
    Check {
        /// Line template ({id}, {title}, {url}, {date})
        #[arg(long, default_value = "{id}  {date}  {title}")]
        format: String,
    },

    /// Validate configuration
    Validate,

    /// Show storage info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the env file. Returns whether a file was found.
fn load_env_file(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => {
            log::debug!("Loaded environment from {}", path.display());
            true
        }
        Err(e) if e.not_found() => false,
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            true
        }
    }
}

/// Write a `.env.example` beside the env file so first-time users have a starting point.
fn write_env_template(env_file: &Path) -> std::io::Result<PathBuf> {
    let path = env_file.with_file_name(".env.example");
    let template = format!(
        "# notice-relay settings\n\
         # Discord webhook URL (required)\n\
         {ENV_WEBHOOK_URL}={WEBHOOK_PLACEHOLDER}\n\
         \n\
         # Seconds between checks (default: 300)\n\
         {ENV_CHECK_INTERVAL}=300\n\
         \n\
         # Mark notices present at first start as already sent (default: true)\n\
         {ENV_SKIP_INITIAL}=true\n"
    );
    std::fs::write(&path, template)?;
    Ok(path)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let env_loaded = load_env_file(&cli.env_file);

    let config_path = cli.storage_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);
    if let Err(e) = config.apply_env() {
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    let command = cli.command.unwrap_or(Command::Run);
    let needs_webhook = matches!(command, Command::Run | Command::Validate);

    let result = match command {
        Command::Run => run(&config, &cli.storage_dir).await,
        Command::Check { format } => check(&config, &cli.storage_dir, &format).await,
        Command::Validate => validate(&config),
        Command::Info => info(&config, &cli.storage_dir).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            if needs_webhook && config.webhook_url().is_err() {
                explain_webhook_setup(&cli.env_file, env_loaded);
            }
            ExitCode::FAILURE
        }
    }
}

fn explain_webhook_setup(env_file: &Path, env_loaded: bool) {
    if env_loaded {
        log::error!(
            "Set {} in {} and start again.",
            ENV_WEBHOOK_URL,
            env_file.display()
        );
        return;
    }

    log::error!("No environment file found at {}.", env_file.display());
    match write_env_template(env_file) {
        Ok(path) => {
            log::info!("Wrote a template to {}.", path.display());
            log::info!("1. Copy {} to {}", path.display(), env_file.display());
            log::info!("2. Set {} in it", ENV_WEBHOOK_URL);
            log::info!("3. Start notice-relay again");
        }
        Err(e) => log::warn!("Could not write env template: {}", e),
    }
}

fn seen_store(config: &Config, storage_dir: &Path) -> LocalSeenStore {
    LocalSeenStore::new(storage_dir.join(&config.watch.seen_file))
}

async fn run(config: &Config, storage_dir: &Path) -> Result<()> {
    config.validate()?;

    let client = http::create_async_client(&config.crawler)?;
    let board = NoticeBoard::from_config(config, client.clone())?;
    let notifier = WebhookNotifier::from_config(config, client)?;
    let store = seen_store(config, storage_dir);

    log::info!("{}", "═".repeat(50));
    log::info!("  notice-relay: watching {}", config.crawler.list_url);
    log::info!("{}", "═".repeat(50));
    log::info!(
        "Check interval: {}s ({}min)",
        config.watch.interval_secs,
        config.watch.interval_secs / 60
    );
    log::info!("Skip initial notices: {}", config.watch.skip_initial);
    log::info!("Seen-set: {}", store.location());
    log::info!("Press Ctrl+C to stop");

    let (trigger, shutdown) = pipeline::shutdown::channel();
    pipeline::listen_for_signals(trigger)?;

    let watcher = Watcher::start(
        Arc::new(board),
        Arc::new(notifier),
        Arc::new(store),
        WatchOptions::from_config(config),
    )
    .await;
    watcher.run(shutdown).await;

    log::info!("Stopped.");
    Ok(())
}

async fn check(config: &Config, storage_dir: &Path, format: &str) -> Result<()> {
    let client = http::create_async_client(&config.crawler)?;
    let board = NoticeBoard::from_config(config, client)?;
    let seen = seen_store(config, storage_dir).load().await;

    let announcements = board.fetch().await?;
    let fresh: HashSet<&str> = fresh_announcements(&seen, &announcements)
        .into_iter()
        .map(|a| a.id.as_str())
        .collect();

    for announcement in &announcements {
        let marker = if fresh.contains(announcement.id.as_str()) {
            "[new] "
        } else {
            "[seen]"
        };
        println!("{} {}", marker, announcement.format(format));
    }

    log::info!(
        "{} announcements listed, {} not yet sent",
        announcements.len(),
        fresh.len()
    );
    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    log::info!("Validating configuration...");
    config.validate()?;
    AnnouncementExtractor::from_config(config)?;
    log::info!("✓ Config OK");
    Ok(())
}

async fn info(config: &Config, storage_dir: &Path) -> Result<()> {
    let store = seen_store(config, storage_dir);
    log::info!("Storage directory: {}", storage_dir.display());
    log::info!(
        "Seen-set: {} ({})",
        store.location(),
        if store.path().exists() {
            "exists"
        } else {
            "not found"
        }
    );
    log::info!("Seen ids: {}", store.load().await.len());
    log::info!("Listing: {}", config.crawler.list_url);
    log::info!(
        "Webhook: {}",
        if config.webhook_url().is_ok() {
            "configured"
        } else {
            "missing"
        }
    );
    Ok(())
}
