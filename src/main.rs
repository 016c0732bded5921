use anyhow::{Context, Result};
use clap::Parser;
use reqwest::redirect::Policy;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use scholar::app::{App, AppEvent};
use scholar::cache::CacheStore;
use scholar::catalog::{fallback_catalog, CatalogFetcher};
use scholar::chat::{ChatStatus, HttpChatTransport, ReplyEvent};
use scholar::config::Config;
use scholar::session::Session;
use scholar::storage::{Database, DatabaseError};
use scholar::util::{endpoint_url, validate_base_url};

/// Get the config directory path (~/.config/scholar/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("scholar"))
}

/// Limit redirects to 3 hops and refuse loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }
        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }
        tracing::debug!(
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "scholar",
    about = "Terminal client for the TrueScholar education assistant"
)]
struct Args {
    /// Config file (default: ~/.config/scholar/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Assistant service origin, overriding config and environment
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Delete the local cache before starting
    #[arg(long)]
    reset_cache: bool,

    /// Print the suggested questions and exit
    #[arg(long)]
    list_questions: bool,

    /// Ask one question, stream the answer to stdout, and exit
    #[arg(long, value_name = "TEXT")]
    ask: Option<String>,

    /// Write logs to this file (RUST_LOG sets the level)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// Route logs to `log_file` when given, else stderr.
///
/// The TUI owns the terminal, so stderr logging is only useful for the
/// one-shot modes.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Create the config directory with user-only permissions.
fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(config_dir, std::fs::Permissions::from_mode(0o700))
        {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }
    Ok(())
}

/// Remove the cache database and its SQLite side files.
fn reset_cache(db_path: &Path) -> Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let mut name = db_path.as_os_str().to_owned();
        name.push(suffix);
        let path = PathBuf::from(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to delete '{}'", path.display()))?;
        }
    }
    println!("Cache reset.");
    Ok(())
}

/// Print the questions every card would show, then exit.
async fn list_questions(config: &Config, fetcher: &CatalogFetcher<Database>) -> Result<()> {
    let mut session = Session::new(config.cards.clone(), fallback_catalog(), config.scroll_step);
    session.install_catalog(fetcher.load().await);

    let mut out = std::io::stdout().lock();
    for card in &config.cards {
        writeln!(out, "{}", card.name)?;
        for sub in &card.sub_tabs {
            let questions = session.questions_for(&card.name, sub, config.max_questions());
            if questions.is_empty() {
                continue;
            }
            writeln!(out, "  {}", sub)?;
            for question in questions {
                writeln!(out, "    - {}", question)?;
            }
        }
    }
    Ok(())
}

/// Ask one question and stream the reply to stdout.
async fn ask_once(config: &Config, backend: &HttpChatTransport, text: &str) -> Result<()> {
    let mut session = Session::new(config.cards.clone(), fallback_catalog(), config.scroll_step);
    let exchange = session
        .submit_free_text(text)
        .ok_or_else(|| anyhow::anyhow!("Question must not be blank"))?;

    let mut stdout = std::io::stdout();
    let status = session
        .try_run_exchange(backend, exchange, |event| match event {
            ReplyEvent::Delta(delta) => {
                write!(stdout, "{}", delta)?;
                stdout.flush()
            }
            _ => Ok(()),
        })
        .await
        .context("Failed to write reply to stdout")?;
    println!();

    match status {
        ChatStatus::Ready => Ok(()),
        _ => {
            let reason = session.chat().error().unwrap_or("reply ended early");
            anyhow::bail!("{}: {}", scholar::chat::ERROR_NOTICE, reason)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref())?;

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config '{}'", config_path.display()))?
        .with_env_overrides(|key| std::env::var(key).ok());
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    tracing::debug!(?config, "Effective configuration");

    let base = validate_base_url(&config.base_url)
        .with_context(|| format!("Invalid base URL '{}'", config.base_url))?;

    let db_path = config_dir.join("cache.db");
    if args.reset_cache {
        reset_cache(&db_path)?;
    }
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in cache path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of scholar appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open cache: {}", e)),
    };

    // No overall request timeout: a reply stream stays open as long as the
    // assistant keeps writing. The catalog fetch carries its own timeout.
    let client = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .context("Failed to build HTTP client")?;

    let fetcher = CatalogFetcher::new(
        client.clone(),
        endpoint_url(&base, &config.catalog_path),
        CacheStore::new(db),
    )
    .with_ttl(config.cache_ttl())
    .with_timeout(config.catalog_timeout());
    let backend = HttpChatTransport::new(
        client,
        endpoint_url(&base, &config.chat_path),
        config.api_token_secret(),
    );

    if args.list_questions {
        return list_questions(&config, &fetcher).await;
    }
    if let Some(text) = &args.ask {
        return ask_once(&config, &backend, text).await;
    }

    let mut app = App::new(&config, Arc::new(fetcher), Arc::new(backend));
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(64);
    scholar::ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
