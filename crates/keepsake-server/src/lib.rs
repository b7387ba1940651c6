// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{any, get};
use axum::Router;
use keepsake_store::{
    GalleryStore, LocalFsStore, StoreError, StoreInstrumentation, StoreLayout,
    StoreMetricsCollector,
};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::Mutex;

mod config;
mod http;
mod middleware;

pub use config::{validate_startup_config_contract, ServerConfig, CONFIG_SCHEMA_VERSION};

pub const CRATE_NAME: &str = "keepsake-server";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GalleryStore>,
    pub layout: StoreLayout,
    pub store_metrics: Arc<StoreMetricsCollector>,
    /// Serializes read-modify-write cycles issued by this process.
    pub write_gate: Arc<Mutex<()>>,
    pub request_id_seed: Arc<AtomicU64>,
    pub config: ServerConfig,
}

impl AppState {
    /// Opens the local store under `config.data_root`, creating its layout if needed.
    pub fn new(config: ServerConfig) -> Result<Self, StoreError> {
        let layout = StoreLayout::under_data_root(&config.data_root);
        let store_metrics = Arc::new(StoreMetricsCollector::default());
        let instrumentation: Arc<dyn StoreInstrumentation> = store_metrics.clone();
        let store = LocalFsStore::open(layout.clone())?.with_instrumentation(instrumentation);
        Ok(Self {
            store: Arc::new(store),
            layout,
            store_metrics,
            write_gate: Arc::new(Mutex::new(())),
            request_id_seed: Arc::new(AtomicU64::new(1)),
            config,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api", any(http::handlers::api_handler))
        .route("/api/", any(http::handlers::api_handler))
        .route("/api/index.php", any(http::handlers::api_handler))
        .route(
            "/images/uploads/:file",
            get(http::uploads::uploaded_file_handler),
        )
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/metrics", get(http::handlers::metrics_handler))
        .fallback(http::handlers::unsupported_route_handler)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .with_state(state)
}
