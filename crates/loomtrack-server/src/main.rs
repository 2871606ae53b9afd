#![forbid(unsafe_code)]

use loomtrack_server::{
    build_router, validate_startup_config_contract, ApiConfig, AppState,
};
use loomtrack_store::InventoryStore;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("LOOM_LOG_JSON", true) {
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
    init_tracing();

    let bind_addr = env::var("LOOM_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let db_path = PathBuf::from(
        env::var("LOOM_DB_PATH").unwrap_or_else(|_| "data/loomtrack.db".to_string()),
    );

    let api_cfg = ApiConfig {
        max_body_bytes: env_usize("LOOM_MAX_BODY_BYTES", 16 * 1024),
        default_transaction_limit: env_usize("LOOM_DEFAULT_TRANSACTION_LIMIT", 50),
        max_transaction_limit: env_usize("LOOM_MAX_TRANSACTION_LIMIT", 500),
        recent_transactions_limit: env_usize("LOOM_RECENT_TRANSACTIONS_LIMIT", 10),
        dashboard_recent_limit: env_usize("LOOM_DASHBOARD_RECENT_LIMIT", 10),
        default_min_stock_level: env_u64("LOOM_DEFAULT_MIN_STOCK_LEVEL", 10) as i64,
    };
    validate_startup_config_contract(&api_cfg)?;

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("create database directory failed: {e}"))?;
        }
    }
    let store = InventoryStore::open(&db_path).map_err(|e| format!("open store failed: {e}"))?;

    let state = AppState::with_config(store, api_cfg);
    let app = build_router(state.clone());

    let addr: std::net::SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;
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
    info!("loomtrack-server listening on {bind_addr}");

    let accepting = state.accepting_requests.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            // Refuse new mutations first, then give in-flight requests a
            // moment to drain.
            accepting.store(false, Ordering::Relaxed);
            let drain_ms = env_u64("LOOM_SHUTDOWN_DRAIN_MS", 3000);
            tokio::time::sleep(Duration::from_millis(drain_ms)).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
