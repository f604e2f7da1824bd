//! Title Fetch CLI Application
//!
//! Reads a newline-delimited list of URLs, fetches every page concurrently
//! (optionally through a proxy) and prints `<title> (<url>)` per page.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use std::process;
use std::time::Duration;
use title_fetch_lib::{
    load_env_config, parse_timeout_string, read_urls, resolve_proxy, ConfigManager, Dispatcher,
    FetchConfig, FileConfig, TitleFetchError, MAX_CONCURRENCY, VERSION,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

const MISSING_WORDLIST: &str = "Please provide a file containing URLs with -w option.";

/// CLI arguments for title-fetch
#[derive(Parser, Debug)]
#[command(name = "title-fetch")]
#[command(version = VERSION)]
#[command(about = "Fetch web pages concurrently and print their titles")]
#[command(
    long_about = "Fetch every URL in a file concurrently and print '<title> (<url>)' for each page.\n\nRequests can go through an HTTP/HTTPS proxy. Failures are reported on stderr and never stop the run."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// File containing URLs, one per line
    #[arg(short = 'w', long = "wordlist", value_name = "FILE", help_heading = "Input")]
    pub wordlist: Option<String>,

    /// Proxy URL (e.g. http://127.0.0.1:8080); defaults to HTTP_PROXY/HTTPS_PROXY
    #[arg(short = 'p', long = "proxy", value_name = "URL", help_heading = "Network")]
    pub proxy: Option<String>,

    /// Verify TLS certificates (skipped by default)
    #[arg(long = "verify-tls", help_heading = "Network")]
    pub verify_tls: bool,

    /// Per-request timeout, e.g. "10s", "1m" (default: 10s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Max simultaneous requests (default: unlimited)
    #[arg(short = 'c', long = "concurrency", value_name = "N", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// URLs dispatched per batch (default: 20)
    #[arg(long = "batch-size", value_name = "N", help_heading = "Performance")]
    pub batch_size: Option<usize>,

    /// Use specific config file
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.verbose);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr logger. `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let default_directives = if verbose {
        "title_fetch=debug,title_fetch_lib=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(console::colors_enabled_stderr())
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    match &args.wordlist {
        Some(path) if !path.is_empty() => {}
        _ => return Err(MISSING_WORDLIST.to_string()),
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(format!(
                "Concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            ));
        }
    }

    if args.batch_size == Some(0) {
        return Err("Batch size must be at least 1".to_string());
    }

    Ok(())
}

async fn run(args: Args) -> Result<(), TitleFetchError> {
    debug!("title-fetch {}", VERSION);
    let config = build_config(&args)?;

    let wordlist = args.wordlist.as_deref().unwrap_or_default();
    let urls = read_urls(wordlist)?;
    info!("Loaded {} URLs from {}", urls.len(), wordlist);

    let dispatcher = Dispatcher::new(config)?;
    let summary = dispatcher.run(urls).await;

    debug!(
        "Dispatched {} URLs in {} batches",
        summary.urls, summary.batches
    );
    Ok(())
}

/// Build the fetch configuration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (TF_*)
/// 3. Config file (--config or TF_CONFIG)
/// 4. Built-in defaults
///
/// The proxy follows the same order, with the ambient HTTP_PROXY /
/// HTTPS_PROXY / NO_PROXY variables as the last resort.
fn build_config(args: &Args) -> Result<FetchConfig, TitleFetchError> {
    let env_config = load_env_config();

    let file_config = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => {
            debug!("Using config file {}", path);
            ConfigManager::load_file(path)?
        }
        None => FileConfig::default(),
    };

    // Scanning arbitrary hosts: skip certificate checks unless asked not to.
    let config = FetchConfig::default().with_accept_invalid_certs(true);
    let config = file_config.apply_to(config);
    let config = env_config.apply_to(config);
    let config = apply_cli_args_to_config(config, args)?;

    let proxy = resolve_proxy(args.proxy.as_deref().or(file_config.proxy()));
    let config = config.with_proxy(proxy);

    config.validate()?;
    Ok(config)
}

/// Apply CLI arguments to config (highest precedence).
fn apply_cli_args_to_config(
    mut config: FetchConfig,
    args: &Args,
) -> Result<FetchConfig, TitleFetchError> {
    if let Some(timeout) = &args.timeout {
        let secs = parse_timeout_string(timeout)
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                TitleFetchError::config(format!(
                    "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                    timeout
                ))
            })?;
        config.request_timeout = Duration::from_secs(secs);
    }

    if let Some(concurrency) = args.concurrency {
        config.max_in_flight = Some(concurrency);
    }

    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }

    // Only an explicit flag overrides config/env values.
    if args.verify_tls {
        config.accept_invalid_certs = false;
    }

    Ok(config)
}
