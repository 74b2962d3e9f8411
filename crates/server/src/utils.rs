use avwx_core::{
    find_config_file, load_config, ClassificationScheme, ConfigSource, DEFAULT_SERVER_PORT,
};
use clap::Parser;
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use log::LevelFilter;
use std::env;
use time::{format_description::well_known::Iso8601, OffsetDateTime};

pub use avwx_core::create_dir_all;

/// Create a folder (legacy wrapper for compatibility)
pub fn create_folder(root_path: &str) {
    let _ = create_dir_all(root_path);
}

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "avwx monitor - Flight-category snapshot store and history API"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $AVWX_SERVER_CONFIG, ./server.toml,
    /// $XDG_CONFIG_HOME/avwx-monitor/server.toml, /etc/avwx-monitor/server.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "AVWX_SERVER_LEVEL")]
    pub level: Option<String>,

    /// Host to listen on (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, env = "AVWX_SERVER_HOST")]
    #[serde(alias = "host")]
    pub domain: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "AVWX_SERVER_PORT")]
    pub port: Option<String>,

    /// Public URL for API responses and UI
    #[arg(short, long, env = "AVWX_SERVER_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Directory for the snapshot database
    #[arg(short = 'd', long, env = "AVWX_SERVER_SNAPSHOT_DB")]
    #[serde(alias = "data_dir")]
    pub snapshot_db: Option<String>,

    /// Classification scheme: four_tier or two_tier
    #[arg(short = 's', long, env = "AVWX_SERVER_SCHEME")]
    pub scheme: Option<String>,
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn host(&self) -> String {
        self.domain
            .clone()
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> String {
        self.port
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVER_PORT.to_string())
    }

    pub fn remote_url(&self) -> String {
        self.remote_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host(), self.port()))
    }

    pub fn snapshot_db(&self) -> String {
        self.snapshot_db
            .clone()
            .unwrap_or_else(|| "./snapshot_data".to_string())
    }

    /// Falls back to the four-tier table when unset or unrecognized
    pub fn scheme(&self) -> ClassificationScheme {
        self.scheme
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    // Determine config file path
    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("AVWX_SERVER_CONFIG", "server.toml")
    };

    // Log where we're loading config from
    if let Some(path) = source.path() {
        log::info!("Loading config from: {}", path.display());
    }

    // Load from config file
    let file_config: Cli = load_config(&source).unwrap_or_default();

    // CLI args override file config (env vars are handled by clap)
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        domain: cli_args.domain.or(file_config.domain),
        port: cli_args.port.or(file_config.port),
        remote_url: cli_args.remote_url.or(file_config.remote_url),
        snapshot_db: cli_args.snapshot_db.or(file_config.snapshot_db),
        scheme: cli_args.scheme.or(file_config.scheme),
    }
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}: {}",
                OffsetDateTime::now_utc().format(&Iso8601::DEFAULT).unwrap(),
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}
