//! Versioned static assets.
//!
//! `/asset/{app}/{hash}/{path}` is served from `{assets_dir}/{path}`. The app
//! and hash segments only exist to bust caches and are ignored.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, Uri};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::http::response::{internal_error, not_found};
use crate::routing::clean_path;

#[derive(Debug, Clone)]
pub struct AssetHandler {
    dir: PathBuf,
}

impl AssetHandler {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The path inside the assets directory, or `None` when the app or hash segment is missing.
    pub fn asset_path(request_path: &str) -> Option<String> {
        let cleaned = clean_path(request_path);
        if cleaned.matches('/').count() < 3 {
            return None;
        }
        let rest: Vec<&str> = cleaned.split('/').skip(4).collect();
        Some(clean_path(&rest.join("/")))
    }

    pub async fn serve(&self, request: Request<Body>) -> Response {
        let Some(path) = Self::asset_path(request.uri().path()) else {
            return not_found();
        };

        let (mut parts, body) = request.into_parts();
        let rewritten = match parts.uri.query() {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };
        parts.uri = match rewritten.parse::<Uri>() {
            Ok(uri) => uri,
            Err(_) => return internal_error(),
        };

        match ServeDir::new(&self.dir)
            .oneshot(Request::from_parts(parts, body))
            .await
        {
            Ok(response) => response.map(Body::new).into_response(),
            Err(never) => match never {},
        }
    }
}
