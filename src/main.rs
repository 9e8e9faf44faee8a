use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ubergallery::{config::Config, thumbnail::ThumbnailCache, web::WebServer};

#[derive(Parser)]
#[command(name = "ubergallery")]
#[command(version)]
#[command(about = "A directory image gallery with an on-demand thumbnail cache")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = ubergallery::config::defaults::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level (defaults to debug when enable_debugging is set, info otherwise)
    #[arg(short = 'v', long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load_from_file(&cli.config)?;

    let log_level = cli.log_level.unwrap_or_else(|| {
        if loaded.config.advanced_settings.enable_debugging {
            "debug".to_string()
        } else {
            "info".to_string()
        }
    });
    let log_filter = if log_level == "trace" {
        format!("ubergallery={},tower_http=trace", log_level)
    } else {
        format!("ubergallery={}", log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting UberGallery v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", cli.config);
    loaded.log_warnings(&cli.config);

    let mut config = loaded.config;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let cache = ThumbnailCache::from_config(&config);
    cache.ensure_cache_dir().await?;
    info!(
        "Thumbnails: {}x{} at quality {} in {}",
        cache.spec().max_width,
        cache.spec().max_height,
        cache.spec().quality.value(),
        cache.cache_dir().display()
    );
    if !config.storage.gallery_dir.is_dir() {
        warn!(
            "Gallery directory {} does not exist; the gallery page will report an error until it does",
            config.storage.gallery_dir.display()
        );
    }

    let server = WebServer::new(config)?;
    info!("Web server configured for {}:{}", server.host(), server.port());
    server.serve().await?;

    Ok(())
}
