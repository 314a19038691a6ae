//! HTTP server lifecycle — composition root, bind, graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::auth::{IdentityResolver, TokenVerifier};
use crate::config::Settings;
use crate::proxy::AgnoProxy;
use crate::router::{AppState, create_router};
use crate::store;
use crate::{Error, Result};

/// Build the application state: open the store, create the shared HTTP
/// client, and wire the auth/identity/proxy components.
pub async fn build_state(settings: Settings) -> Result<Arc<AppState>> {
    let db = store::init_pool(&settings.database_url).await?;
    store::ensure_schema(&db).await?;

    let http = reqwest::Client::new();
    let verifier = TokenVerifier::new(&settings);
    let identity = IdentityResolver::new(&settings, http.clone());
    let proxy = AgnoProxy::new(&settings, http)?;

    Ok(Arc::new(AppState {
        settings,
        db,
        verifier,
        identity,
        proxy,
    }))
}

/// Run the server until a shutdown signal arrives.
pub async fn run(settings: Settings) -> Result<()> {
    let addr = SocketAddr::new(
        settings
            .host
            .parse()
            .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
        settings.port,
    );

    let state = build_state(settings).await?;
    let app = create_router(Arc::clone(&state));

    let listener = TcpListener::bind(addr).await?;

    info!(
        host = %state.settings.host,
        port = state.settings.port,
        "toolgate v{} listening",
        env!("CARGO_PKG_VERSION")
    );
    info!(upstream = %state.settings.agno_base(), "agent backend");
    if state.identity.is_configured() {
        info!("canonical identity resolution enabled");
    }
    if state.settings.agno_api_key.is_none() {
        warn!("AGNO_API_KEY not set - client Authorization headers are stripped, not replaced");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
