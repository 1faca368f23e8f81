//! The swap point between the supervisor and the HTTP server.
//!
//! # Design Decisions
//! - One `ArcSwapOption` cell: readers load a snapshot without locking, the
//!   writer replaces it in a single pointer store
//! - A request keeps the `Arc` it loaded for its whole lifetime, so a swap
//!   never affects a request already in flight
//! - Injected explicitly into the server and the supervisor; no global

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use crate::http::response::not_found;

/// Holds the currently published request handler.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    current: ArcSwapOption<Router>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler`, replacing whatever was published before.
    pub fn set(&self, handler: Router) {
        self.current.store(Some(Arc::new(handler)));
    }

    /// Whether a handler has been published yet.
    pub fn is_installed(&self) -> bool {
        self.current.load().is_some()
    }

    /// Dispatch `request` to the current handler, or answer 404.
    pub async fn serve(&self, request: Request<Body>) -> Response {
        let Some(handler) = self.current.load_full() else {
            return not_found();
        };

        let router = Router::clone(&handler);
        match router.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}
