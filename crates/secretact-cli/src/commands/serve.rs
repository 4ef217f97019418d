//! HTTP service command

use crate::error::CliResult;
use secretact_core::mask_credential;
use secretact_server::{discovery, restapi, AppState, ServiceConfig, SharedRegistration};
use tracing::{info, warn};

/// Run the service until SIGINT/SIGTERM
pub async fn execute(config: ServiceConfig) -> CliResult<()> {
    info!("Starting Infisical semantic service on port {}", config.port);
    info!("Environment variables:");
    info!("  - INFISICAL_CLIENT_ID: {}", mask_credential(config.client_id.as_deref().unwrap_or_default()));
    info!(
        "  - INFISICAL_CLIENT_SECRET: {}",
        mask_credential(config.client_secret.as_deref().unwrap_or_default())
    );
    match config.infisical_url() {
        Some(url) => info!("  - INFISICAL_URL: {}", url),
        None => info!("  - INFISICAL_URL: <not set> (target.url required on every action)"),
    }
    if config.credentials().is_none() {
        warn!("Infisical credentials not configured; secret actions will fail");
    }
    if config.api_key().is_none() {
        warn!("No API key configured, action endpoints are unauthenticated (development mode)");
    }

    let addr = config.bind_addr();
    let app_state = AppState::from_config(config)?;
    let listener = restapi::bind(&addr).await?;

    let registration = SharedRegistration::new(
        discovery::register_service(&app_state.config, &app_state.registry).await,
    );

    let on_signal = registration.clone();
    let shutdown = async move {
        shutdown_signal().await;
        info!("Shutting down server...");
        on_signal.release().await;
    };

    let served = restapi::serve_on(listener, app_state, shutdown).await;
    // The signal path has already deregistered; this covers serve errors.
    registration.release().await;
    served?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
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
