use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import modules from the library crate
use videoportal_server::catalog::{CatalogService, CrmMediaSource};
use videoportal_server::config;
use videoportal_server::crm::{CrmOAuthClient, CrmQueryClient};
use videoportal_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use videoportal_server::user::{CrmHistorySource, HistorySource};
use videoportal_server::videohost::YouTubeClient;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8080)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of catalog responses in client caches, in seconds.
    #[clap(long, default_value_t = 300)]
    pub content_cache_age_sec: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            content_cache_age_sec: args.content_cache_age_sec,
            frontend_dir_path: args.frontend_dir_path.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  port: {}", app_config.port);
    info!("  crm token endpoint: {}", app_config.crm.token_url);
    info!("  video host: {}", app_config.video_host.api_base_url);

    // Initialize metrics system
    info!("Initializing metrics...");
    metrics::init_metrics();

    // Update process memory gauge periodically
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            metrics::update_memory_usage();
        }
    });

    let oauth = Arc::new(CrmOAuthClient::new(app_config.crm.clone())?);
    let query = Arc::new(CrmQueryClient::new(
        &app_config.crm.api_version,
        app_config.crm.timeout_sec,
    )?);

    let media_source = Arc::new(CrmMediaSource::new(oauth.clone(), query.clone()));
    let metadata_source = Arc::new(YouTubeClient::new(&app_config.video_host)?);
    let catalog = Arc::new(CatalogService::new(
        media_source,
        metadata_source,
        &app_config.catalog.default_thumbnail_url,
    ));
    let history: Arc<dyn HistorySource> = Arc::new(CrmHistorySource::new(query));

    // Warm the catalog in the background so the first page load does not
    // pay for the full CRM and video host round trips.
    let warm_catalog = catalog.clone();
    tokio::spawn(async move {
        if let Err(err) = warm_catalog.ensure_loaded().await {
            error!("Initial catalog load failed: {:?}", err);
        }
    });

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        content_cache_age_sec: app_config.content_cache_age_sec,
        frontend_dir_path: app_config.frontend_dir_path.clone(),
        default_user_id: app_config.crm.default_user_id.clone(),
        session_override: app_config.session_override.clone(),
    };

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);

    tokio::select! {
        result = run_server(oauth, catalog, history, server_config) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
