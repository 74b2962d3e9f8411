use std::{
    env,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Error};
use avwx_core::{
    find_config_file, load_config, ConfigSource, DEFAULT_FETCH_INTERVAL, DEFAULT_SERVER_PORT,
};
use clap::Parser;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use slog::{debug, o, Drain, Level, Logger};
use tokio::sync::Mutex;

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "avwx daemon - Fetches METAR/TAF data and uploads it to the monitor server"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $AVWX_DAEMON_CONFIG, ./daemon.toml,
    /// $XDG_CONFIG_HOME/avwx-monitor/daemon.toml, /etc/avwx-monitor/daemon.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "AVWX_DAEMON_LEVEL")]
    pub level: Option<String>,

    /// Monitor server URL to upload fetched reports to
    #[arg(short, long, env = "AVWX_DAEMON_BASE_URL")]
    pub base_url: Option<String>,

    /// Aviation weather data provider base URL
    #[arg(short = 'w', long, env = "AVWX_DAEMON_PROVIDER_URL")]
    pub provider_url: Option<String>,

    /// Comma-separated ICAO station ids to watch (defaults to a built-in
    /// list of major US airports)
    #[arg(short, long, env = "AVWX_DAEMON_STATIONS")]
    pub stations: Option<String>,

    /// Fetch interval in seconds (METARs refresh roughly hourly)
    #[arg(short = 'i', long, env = "AVWX_DAEMON_SLEEP_INTERVAL")]
    pub sleep_interval: Option<u64>,

    /// Rate limiter refill rate in seconds
    #[arg(short, long, env = "AVWX_DAEMON_REFILL_RATE")]
    pub refill_rate: Option<f64>,

    /// Rate limiter token capacity
    #[arg(short, long, env = "AVWX_DAEMON_TOKEN_CAPACITY")]
    pub token_capacity: Option<usize>,

    /// HTTP User-Agent header for provider requests
    #[arg(short, long, env = "AVWX_DAEMON_USER_AGENT")]
    pub user_agent: Option<String>,
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", DEFAULT_SERVER_PORT))
    }

    pub fn provider_url(&self) -> String {
        self.provider_url
            .clone()
            .unwrap_or_else(|| "https://aviationweather.gov".to_string())
    }

    pub fn sleep_interval(&self) -> u64 {
        self.sleep_interval.unwrap_or(DEFAULT_FETCH_INTERVAL)
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate.unwrap_or(15.0)
    }

    pub fn token_capacity(&self) -> usize {
        self.token_capacity.unwrap_or(3)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| "avwx-monitor-daemon/1.0".to_string())
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    // Determine config file path
    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("AVWX_DAEMON_CONFIG", "daemon.toml")
    };

    // Load from config file
    let file_config: Cli = load_config(&source).unwrap_or_default();

    // CLI args override file config (env vars are handled by clap)
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        base_url: cli_args.base_url.or(file_config.base_url),
        provider_url: cli_args.provider_url.or(file_config.provider_url),
        stations: cli_args.stations.or(file_config.stations),
        sleep_interval: cli_args.sleep_interval.or(file_config.sleep_interval),
        refill_rate: cli_args.refill_rate.or(file_config.refill_rate),
        token_capacity: cli_args.token_capacity.or(file_config.token_capacity),
        user_agent: cli_args.user_agent.or(file_config.user_agent),
    }
}

pub fn setup_logger(cli: &Cli) -> Logger {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_default();
    let log_level = match level_str.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    };

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = drain.filter_level(log_level).fuse();
    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

pub struct RateLimiter {
    capacity: usize,
    tokens: f64,
    last_refill: Instant,
    refill_rate: f64,
}

impl RateLimiter {
    pub fn new(capacity: usize, refill_rate: f64) -> Self {
        RateLimiter {
            capacity,
            tokens: capacity as f64,
            last_refill: Instant::now(),
            refill_rate,
        }
    }

    fn refill_tokens(&mut self) {
        let now = Instant::now();
        let elapsed_time = now.duration_since(self.last_refill).as_secs_f64();
        let tokens_to_add = elapsed_time * self.refill_rate;

        self.tokens += tokens_to_add.min(self.capacity as f64);
        self.last_refill = now;
    }

    fn try_acquire(&mut self, tokens: f64) -> bool {
        let mut retries = 0;

        loop {
            self.refill_tokens();

            if tokens <= self.tokens {
                self.tokens -= tokens;
                return true;
            } else {
                if retries >= 3 {
                    return false;
                }
                retries += 1;
                thread::sleep(Duration::from_secs(20));
            }
        }
    }
}

/// Rate-limited JSON fetcher with retry on transient failures
pub struct ApiFetcher {
    logger: Logger,
    client: ClientWithMiddleware,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiFetcher {
    pub fn new(
        logger: Logger,
        user_agent: String,
        rate_limiter: Arc<Mutex<RateLimiter>>,
    ) -> Result<ApiFetcher, Error> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(Client::builder().user_agent(&user_agent).build()?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            logger,
            client,
            rate_limiter,
        })
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let mut limiter = self.rate_limiter.lock().await;
        if !limiter.try_acquire(1.0) {
            return Err(anyhow!("Rate limit exceeded after retries"));
        }
        drop(limiter);

        debug!(self.logger, "requesting: {}", url);
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(20))
            .send()
            .await
            .map_err(|e| anyhow!("error sending request: {}", e))?;
        if !response.status().is_success() {
            return Err(anyhow!("error response from request: {}", response.status()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| anyhow!("error parsing body of request: {}", e))
    }
}
