//! Bizsearch Server
//!
//! Serves `POST /business/search` over a small fixed set of businesses
//! fetched from the provider API and cached in Redis for a minute.

mod handlers;
mod provider;
mod router;
mod services;
mod settings;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use bizsearch_core::CacheStore;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use handlers::SearchHandler;
use provider::HttpBusinessProvider;
use router::{RequestHandler, RequestRouter};
use services::BusinessDataService;
use settings::{CacheBackend, ServerConfig};
use storage::{MemoryCache, RedisCache};

/// Application state shared across requests
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<RequestRouter>,
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[FATAL] Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Bizsearch Server v{}", env!("CARGO_PKG_VERSION"));
    info!("PID: {}", std::process::id());

    if let Err(e) = run_server(config).await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(config: &ServerConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if config.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

async fn run_server(config: ServerConfig) -> Result<()> {
    info!(
        "Config loaded: bind={}, cache={:?}, businesses={}",
        config.bind_address,
        config.cache_backend,
        config.business_ids().len()
    );

    // Cache connects in the background; requests are served without it until then
    let cache: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Redis => {
            info!("Connecting to Redis cache...");
            Arc::new(RedisCache::connect(
                &config.redis_url,
                config.redis_connect_timeout(),
            ))
        }
        CacheBackend::Memory => {
            warn!("Using in-memory cache, entries are not shared between instances");
            Arc::new(MemoryCache::new())
        }
    };

    let provider = Arc::new(
        HttpBusinessProvider::new(&config.provider_base_url, config.upstream_timeout())
            .context("Failed to create provider client")?,
    );
    info!("Provider API: {}", config.provider_base_url);

    let businesses = Arc::new(BusinessDataService::new(
        provider,
        cache,
        config.business_ids(),
        config.cache_ttl(),
    ));

    let handlers: Vec<Arc<dyn RequestHandler>> = vec![Arc::new(SearchHandler::new(businesses))];
    let request_router =
        RequestRouter::new(handlers).context("Invalid request handler table")?;
    info!("Routes: {:?}", request_router);

    let app = router::app(AppState {
        router: Arc::new(request_router),
    });

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
