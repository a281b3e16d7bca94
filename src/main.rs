use std::net::SocketAddr;
use std::time::Duration;

use active_model::ConnectionAccessor;
use anyhow::{Context, Result};
use config::AppConfig;
use corretores::{AppState, SessionStore, build_router, migration};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load().context("failed to load application configuration")?;

    let accessor = ConnectionAccessor::new(config.database.clone());
    let db = accessor
        .get_connection()
        .await
        .context("failed to connect to PostgreSQL")?
        .clone();

    migration::run(&db)
        .await
        .context("failed to initialize corretores schema")?;

    let sessions = SessionStore::with_idle_ttl(Duration::from_secs(
        config.server.session_idle_seconds,
    ));
    let app = build_router(AppState::new(db.clone(), config.site.clone()).with_sessions(sessions));

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, base_path = %config.site.base_path, "corretores started");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    db.close().await;
    info!("corretores stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("corretores=debug,active_model=debug,tower_http=info")
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
