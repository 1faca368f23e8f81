//! Reverse proxy to an upstream mapping target.
//!
//! # Responsibilities
//! - Strip the mount prefix and join the rest onto the target path
//! - Merge target and request query strings
//! - Send the upstream `Host`, not the client's
//! - Stream upstream responses back to the client
//!
//! # Design Decisions
//! - Redirects from the upstream are passed through, never followed
//! - Hop-by-hop headers stripped in both directions
//! - Upstream connection failures answer 502

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::http::request::RequestIdExt;
use crate::http::response::{bad_gateway, strip_hop_by_hop};

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Request bodies are buffered before forwarding, up to this size.
const MAX_REQUEST_BODY: usize = 64 * 1024 * 1024;

/// Join two URL paths with exactly one slash between them.
fn join_paths(a: &str, b: &str) -> String {
    match (a.ends_with('/'), b.starts_with('/')) {
        (true, true) => format!("{}{}", a, &b[1..]),
        (false, false) => format!("{a}/{b}"),
        _ => format!("{a}{b}"),
    }
}

/// The upstream URL for a request path and query under `target`.
pub fn join_url(target: &Url, path: &str, query: Option<&str>) -> Url {
    let mut url = target.clone();
    url.set_path(&join_paths(target.path(), path));
    let query = match (target.query().filter(|q| !q.is_empty()), query.filter(|q| !q.is_empty())) {
        (Some(t), Some(r)) => Some(format!("{t}&{r}")),
        (Some(t), None) => Some(t.to_string()),
        (None, Some(r)) => Some(r.to_string()),
        (None, None) => None,
    };
    url.set_query(query.as_deref());
    url
}

#[derive(Debug, Clone)]
pub struct Proxy {
    target: Url,
    strip: String,
    client: reqwest::Client,
}

impl Proxy {
    /// Forward requests under `prefix` to `target`.
    pub fn new(target: Url, prefix: &str, client: reqwest::Client) -> Self {
        Self {
            target,
            strip: prefix.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// The upstream URL for an incoming request URI.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> Url {
        let stripped = path.strip_prefix(self.strip.as_str()).unwrap_or(path);
        join_url(&self.target, stripped, query)
    }

    pub async fn forward(&self, request: Request<Body>) -> Response {
        let request_id = request.request_id().to_string();
        let url = self.upstream_url(request.uri().path(), request.uri().query());

        let (parts, body) = request.into_parts();
        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);

        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            let client_ip = addr.ip().to_string();
            let forwarded = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
                Some(prior) => format!("{prior}, {client_ip}"),
                None => client_ip,
            };
            if let Ok(value) = HeaderValue::from_str(&forwarded) {
                headers.insert(X_FORWARDED_FOR, value);
            }
        }

        tracing::debug!(request_id = %request_id, method = %parts.method, upstream = %url, "Forwarding request");

        let body = match axum::body::to_bytes(body, MAX_REQUEST_BODY).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Cannot read request body");
                return (StatusCode::PAYLOAD_TOO_LARGE, "413 request body too large\n").into_response();
            }
        };

        let mut upstream = self
            .client
            .request(parts.method, url.clone())
            .headers(headers);
        if !body.is_empty() {
            upstream = upstream.body(body);
        }

        let upstream = upstream.send().await;

        match upstream {
            Ok(upstream) => {
                let mut response = Response::builder().status(upstream.status());
                if let Some(headers) = response.headers_mut() {
                    headers.extend(upstream.headers().clone());
                    strip_hop_by_hop(headers);
                }
                response
                    .body(Body::from_stream(upstream.bytes_stream()))
                    .unwrap_or_else(|_| bad_gateway())
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, upstream = %url, error = %e, "Upstream error");
                bad_gateway()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(target: &str, prefix: &str) -> Proxy {
        Proxy::new(Url::parse(target).unwrap(), prefix, reqwest::Client::new())
    }

    #[test]
    fn joins_paths() {
        assert_eq!(join_paths("/v1/", "/users"), "/v1/users");
        assert_eq!(join_paths("/v1", "users"), "/v1/users");
        assert_eq!(join_paths("/v1", "/users"), "/v1/users");
        assert_eq!(join_paths("/", "/"), "/");
    }

    #[test]
    fn strips_prefix_and_joins() {
        let p = proxy("http://127.0.0.1:9000/v1", "/api/");
        assert_eq!(
            p.upstream_url("/api/users/7", None).as_str(),
            "http://127.0.0.1:9000/v1/users/7"
        );
        assert_eq!(p.upstream_url("/api/", None).as_str(), "http://127.0.0.1:9000/v1/");
    }

    #[test]
    fn merges_queries() {
        let p = proxy("http://upstream/base?key=1", "/api/");
        assert_eq!(
            p.upstream_url("/api/x", Some("q=2")).as_str(),
            "http://upstream/base/x?key=1&q=2"
        );
        let p = proxy("http://upstream/", "/");
        assert_eq!(p.upstream_url("/x", Some("q=2")).as_str(), "http://upstream/x?q=2");
        assert_eq!(p.upstream_url("/x", None).as_str(), "http://upstream/x");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let p = proxy(&format!("http://{addr}/"), "/api/");
        let request = Request::builder().uri("/api/x").body(Body::empty()).unwrap();
        assert_eq!(p.forward(request).await.status(), StatusCode::BAD_GATEWAY);
    }
}
