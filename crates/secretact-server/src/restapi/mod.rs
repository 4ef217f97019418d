//! REST API module

pub mod handlers;
pub mod router;

pub use router::create_router;

use crate::{AppState, ServerError, ServerResult};
use std::future::Future;
use tokio::net::TcpListener;

/// Bind the listening socket
pub async fn bind(addr: &str) -> ServerResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))
}

/// Serve on an already bound listener until `shutdown` resolves, then drain
pub async fn serve_on<F>(listener: TcpListener, app_state: AppState, shutdown: F) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(app_state);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Starting REST API server on {}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
