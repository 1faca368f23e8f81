//! Entry page handler.
//!
//! # Responsibilities
//! - Read and parse the entry page once per build
//! - Inject the bootstrap script with the request's host
//! - Rebase relative asset references onto `/asset/{app}/{hash}/`
//! - Answer conditional requests against the per-build ETag
//!
//! # Design Decisions
//! - The ETag is the build hash, so every reload invalidates client caches
//! - Host is JSON-encoded into the script, never spliced raw

use std::path::Path;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use rand::RngCore;
use serde_json::{Map, Value};

use crate::config::ServeConfig;
use crate::http::template::Template;
use crate::reload::{BuildError, Snapshot};

/// A fresh 20-byte random hash, hex encoded.
pub fn boot_hash() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Clone)]
pub struct Bootloader {
    template: Template,
    hash: String,
    etag: HeaderValue,
    base: String,
    app_name: String,
    global: String,
}

impl Bootloader {
    /// Read `path` and prepare it for serving under build `hash`.
    ///
    /// The returned snapshot is taken before the read, so an edit racing the
    /// read still differs from it.
    pub fn load(path: &Path, hash: &str, serve: &ServeConfig) -> Result<(Self, Snapshot), BuildError> {
        let baseline = Snapshot::read(path);
        let data = std::fs::read(path).map_err(|source| BuildError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok((Self::from_bytes(data, hash, serve), baseline))
    }

    pub fn from_bytes(data: Vec<u8>, hash: &str, serve: &ServeConfig) -> Self {
        // Hex hashes are always valid header values.
        let etag = HeaderValue::from_str(&format!("\"{hash}\""))
            .unwrap_or_else(|_| HeaderValue::from_static("\"\""));
        Self {
            template: Template::parse(data),
            hash: hash.to_string(),
            etag,
            base: format!("/asset/{}/{}/", serve.app_name, hash),
            app_name: serve.app_name.clone(),
            global: serve.bootstrap_global.clone(),
        }
    }

    pub fn etag(&self) -> &HeaderValue {
        &self.etag
    }

    /// True when `If-None-Match` names this build.
    fn not_modified(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| v.strip_prefix("W/").unwrap_or(v).as_bytes() == self.etag.as_bytes())
            .unwrap_or(false)
    }

    fn bootstrap_script(&self, host: &str) -> String {
        let mut meta = Map::new();
        meta.insert("commit".into(), Value::from(self.hash.as_str()));
        meta.insert("repo".into(), Value::from(self.app_name.as_str()));
        meta.insert("ref".into(), Value::from("refs/heads/master"));
        meta.insert("master-domain".into(), Value::from(host));
        meta.insert("cdn-domain".into(), Value::from(host));
        meta.insert("app-domain".into(), Value::from(host));
        meta.insert(self.app_name.clone(), Value::Bool(true));

        let json = Value::Object(meta).to_string().replace("</", "<\\/");
        format!("\n<script>\n\tvar {} = {};\n</script>\n", self.global, json)
    }

    /// Render the page for a request with the given headers.
    pub fn respond(&self, headers: &HeaderMap) -> Response {
        let mut response = if self.not_modified(headers) {
            StatusCode::NOT_MODIFIED.into_response()
        } else {
            let host = headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            let head = self.bootstrap_script(host);
            let body = self.template.render(head.as_bytes(), self.base.as_bytes());

            let mut response = Body::from(body).into_response();
            let links = self.template.prefetch_links(&self.base);
            if !links.is_empty() {
                if let Ok(value) = HeaderValue::from_str(&links.join(", ")) {
                    response.headers_mut().insert(header::LINK, value);
                }
            }
            response
        };

        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("must-revalidate, public"),
        );
        headers.insert(header::ETAG, self.etag.clone());
        response
    }
}
