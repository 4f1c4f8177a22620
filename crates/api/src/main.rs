mod config;
mod metrics;
mod routes;
mod store;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use compare::{Comparator, ComparatorConfig};
use ingest::TextExtractor;
use scan::{RetryPolicy, ScanAnalyzer, ScanModels, VisionClient};
use similarity::{CachedEmbedder, Embedder, EmbeddingClient};

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::routes::AppState;
use crate::store::ReportStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env();
    info!(mode = ?config.mode, bind_addr = %config.server.bind_addr, "Starting medical comparison server");

    let embedding_client = EmbeddingClient::new(
        config.embedding.base_url.clone(),
        config.embedding.model.clone(),
    );
    info!(model = embedding_client.model(), cache = config.cache.enabled, "Embedding client ready");

    let (embedder, embedding_cache): (Arc<dyn Embedder>, _) = if config.cache.enabled {
        let cache = Arc::new(CachedEmbedder::new(embedding_client, config.cache.max_entries));
        (cache.clone() as Arc<dyn Embedder>, Some(cache))
    } else {
        (Arc::new(embedding_client) as Arc<dyn Embedder>, None)
    };

    let vision_client = match &config.vision.api_key {
        Some(key) => Some(
            VisionClient::new(
                config.vision.base_url.clone(),
                key.clone(),
                Duration::from_secs(config.vision.request_timeout_secs),
            )
            .context("Failed to build vision client")?
            .with_retry(RetryPolicy::new(
                config.retry.max_retries,
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            )),
        ),
        None => {
            warn!("GROQ_API_KEY not set, scan analysis disabled");
            None
        }
    };

    let analyzer = ScanAnalyzer::new(
        vision_client,
        ScanModels {
            vision_model: config.vision.vision_model.clone(),
            text_model: config.vision.text_model.clone(),
        },
    );

    let state = Arc::new(AppState {
        comparator: Comparator::new(TextExtractor::default(), embedder, ComparatorConfig::default()),
        analyzer,
        store: ReportStore::new(&config.server.data_dir),
        metrics: Metrics::new(),
        embedding_cache,
    });

    let app = routes::router(state, config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    info!("Server listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// `RUST_LOG` filters; `MEDCOMPARE_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("MEDCOMPARE_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
