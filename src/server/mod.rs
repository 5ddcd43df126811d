//! HTTP front-end for the dispatch engine.

mod handlers;
mod routes;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::engine::Engine;
use crate::error::Result;

pub use handlers::AppState;
pub use routes::api_routes;

/// Build the application router for a running engine.
pub fn router(engine: &Engine) -> Router {
    let state = Arc::new(AppState::new(engine));

    Router::new()
        .merge(api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("  GET  /health - Health check");
    tracing::info!("  GET  /stats - Queue and store counters");
    tracing::info!("  POST /predict - Inference through the worker pool");
    tracing::info!("  POST /predict/sync - Inline inference");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
