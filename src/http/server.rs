//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the outer Axum Router
//! - Wire up middleware (tracing, request ID)
//! - Bind to the listener and serve until shutdown
//! - Dispatch every request to the currently published handler
//!
//! # Design Decisions
//! - The outer router never changes; only the registry's handler is swapped
//! - Connect info is attached so the proxy can set `X-Forwarded-For`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::reload::HandlerRegistry;

/// HTTP front end of the dev server.
pub struct DevServer {
    router: Router,
}

impl DevServer {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            router: Self::build_router(registry),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(registry: Arc<HandlerRegistry>) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(registry)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` is cancelled.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch(State(registry): State<Arc<HandlerRegistry>>, request: Request<Body>) -> Response {
    registry.serve(request).await
}
