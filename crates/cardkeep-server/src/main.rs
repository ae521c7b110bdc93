// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use cardkeep_server::{build_router, validate_startup_config_contract, AppConfig, AppState};
use cardkeep_store::Store;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
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

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("CARDKEEP_LOG_JSON", false) {
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

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let defaults = AppConfig::default();
    let config = AppConfig {
        bind_addr: env::var("CARDKEEP_BIND").unwrap_or(defaults.bind_addr),
        database_path: env::var("CARDKEEP_DB")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path),
        auth_secret: env::var("CARDKEEP_AUTH_SECRET").unwrap_or(defaults.auth_secret),
        cookie_name: env::var("CARDKEEP_COOKIE_NAME").unwrap_or(defaults.cookie_name),
        token_ttl: Duration::from_secs(env_u64(
            "CARDKEEP_TOKEN_TTL_SECS",
            defaults.token_ttl.as_secs(),
        )),
        reset_token_ttl: Duration::from_secs(env_u64(
            "CARDKEEP_RESET_TOKEN_TTL_SECS",
            defaults.reset_token_ttl.as_secs(),
        )),
        max_body_bytes: env_usize("CARDKEEP_MAX_BODY_BYTES", defaults.max_body_bytes),
    };
    validate_startup_config_contract(&config)?;

    let store =
        Store::open(&config.database_path).map_err(|e| format!("store open failed: {e}"))?;
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(Arc::new(store), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("cardkeep-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
