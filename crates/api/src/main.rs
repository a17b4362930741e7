//! `livapp-api` HTTP service entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (OTEL + tracing).
//! 3. Derive the field encryption key and build the [`FieldPolicy`].
//! 4. Open the SQLite [`Datastore`].
//! 5. Build the Axum router and serve until Ctrl-C.

mod config;
mod crypto;
mod password;
mod policy;
mod presence;
mod server;
mod store;
mod telemetry;

use anyhow::{Context, Result};
use tracing::info;

use config::Config;
use crypto::{FieldCodec, SecretKey};
use password::PasswordHasher;
use policy::FieldPolicy;
use server::state::AppState;
use store::Datastore;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otlp_endpoint(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        "livapp-api starting"
    );

    // -----------------------------------------------------------------------
    // 3. Field encryption
    // -----------------------------------------------------------------------
    let key = SecretKey::from_passphrase(&cfg.field_encryption_key)
        .context("invalid FIELD_ENCRYPTION_KEY")?;
    let policy = FieldPolicy::new(FieldCodec::new(key));

    // -----------------------------------------------------------------------
    // 4. Datastore
    // -----------------------------------------------------------------------
    let store = Datastore::open(&cfg.database_path)
        .with_context(|| format!("failed to open database {}", cfg.database_path))?;
    info!(path = %cfg.database_path, "datastore opened");

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let online_threshold = chrono::Duration::seconds(
        i64::try_from(cfg.online_threshold_secs).context("ONLINE_THRESHOLD_SECS is too large")?,
    );
    let state = AppState::new(store, policy, PasswordHasher::default(), online_threshold);
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("livapp-api stopped");
    telemetry::shutdown_telemetry();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}
