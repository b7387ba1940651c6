// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use keepsake_server::{
    build_router, validate_startup_config_contract, AppState, ServerConfig, CONFIG_SCHEMA_VERSION,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("signal handlers unavailable, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = ServerConfig::from_env();
    init_tracing(config.log_json);
    validate_startup_config_contract(&config)?;
    match serde_json::to_string(&config) {
        Ok(dump) => info!(
            config_schema_version = CONFIG_SCHEMA_VERSION,
            config = %dump,
            "effective config"
        ),
        Err(e) => warn!("config dump failed: {e}"),
    }

    let state = AppState::new(config.clone())
        .map_err(|e| format!("store init failed for {}: {e}", config.data_root.display()))?;
    info!(
        data_root = %config.data_root.display(),
        uploads_dir = %state.layout.uploads_dir.display(),
        max_body_bytes = config.max_body_bytes,
        "gallery store ready"
    );
    let app = build_router(state);

    let addr: std::net::SocketAddr = config
        .bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {}: {e}", config.bind_addr))?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4().map_err(|e| format!("socket v4 failed: {e}"))?
    } else {
        tokio::net::TcpSocket::new_v6().map_err(|e| format!("socket v6 failed: {e}"))?
    };
    socket
        .set_reuseaddr(true)
        .map_err(|e| format!("set_reuseaddr failed: {e}"))?;
    socket.bind(addr).map_err(|e| format!("bind failed: {e}"))?;
    let listener: TcpListener = socket
        .listen(1024)
        .map_err(|e| format!("listen failed: {e}"))?;
    info!("keepsake-server listening on {}", config.bind_addr);

    let drain = config.shutdown_drain;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            info!(drain_ms = drain.as_millis() as u64, "shutdown requested");
            tokio::time::sleep(drain).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
