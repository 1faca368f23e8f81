//! JSON data tree.
//!
//! `/data/{a}/{b}/{rest}[.json]` answers with the contents of
//! `{data_dir}/{rest}.json` (under `data`) and the entries of the directory
//! `{data_dir}/{rest}` (under `children`, `.json` stripped and deduplicated).
//! The two leading segments are namespaces the client sends but the dev
//! server ignores.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::http::response::{internal_error, not_found};
use crate::routing::clean_path;

#[derive(Debug, Serialize, PartialEq)]
struct Child {
    name: String,
}

#[derive(Debug, Serialize)]
struct DataResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    children: Vec<Child>,
}

#[derive(Debug, Clone)]
pub struct DataHandler {
    dir: PathBuf,
}

impl DataHandler {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The node path under the data directory, or `None` when the namespace segments are missing.
    pub fn node_path(request_path: &str) -> Option<String> {
        let path = request_path.strip_prefix("/data").unwrap_or(request_path);
        let cleaned = clean_path(path);
        let cleaned = cleaned.strip_suffix(".json").unwrap_or(&cleaned);
        if cleaned.matches('/').count() < 2 {
            return None;
        }
        let rest: Vec<&str> = cleaned.split('/').skip(3).collect();
        Some(rest.join("/"))
    }

    pub async fn serve(&self, request_path: &str) -> Response {
        let Some(node) = Self::node_path(request_path) else {
            return not_found();
        };
        let base = if node.is_empty() {
            self.dir.clone()
        } else {
            self.dir.join(&node)
        };

        match load_node(&base).await {
            Ok(Some(body)) => {
                let mut json = match serde_json::to_vec(&body) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(path = %base.display(), error = %e, "Cannot encode data response");
                        return internal_error();
                    }
                };
                json.push(b'\n');
                (
                    [
                        (
                            header::CONTENT_TYPE,
                            HeaderValue::from_static("application/json; charset=utf-8"),
                        ),
                        (
                            header::CACHE_CONTROL,
                            HeaderValue::from_static("public,max-age=86400"),
                        ),
                    ],
                    json,
                )
                    .into_response()
            }
            Ok(None) => not_found(),
            Err(e) => {
                tracing::error!(path = %base.display(), error = %e, "Cannot read data node");
                internal_error()
            }
        }
    }
}

async fn load_node(base: &Path) -> io::Result<Option<DataResponse>> {
    let mut file = base.as_os_str().to_owned();
    file.push(".json");

    let data = match tokio::fs::read(&file).await {
        Ok(bytes) => Some(
            serde_json::from_slice::<Value>(&bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        ),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    let children = match tokio::fs::metadata(base).await {
        Ok(meta) if meta.is_dir() => Some(list_children(base).await?),
        Ok(_) => None,
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    if data.is_none() && children.is_none() {
        return Ok(None);
    }
    Ok(Some(DataResponse {
        data,
        children: children.unwrap_or_default(),
    }))
}

async fn list_children(dir: &Path) -> io::Result<Vec<Child>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    let mut seen = HashSet::new();
    Ok(names
        .into_iter()
        .map(|name| match name.strip_suffix(".json") {
            Some(stem) => stem.to_string(),
            None => name,
        })
        .filter(|name| seen.insert(name.clone()))
        .map(|name| Child { name })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn json_of(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pages/about")).unwrap();
        std::fs::create_dir_all(dir.path().join("drafts")).unwrap();
        std::fs::write(dir.path().join("pages.json"), r#"{"title":"Pages"}"#).unwrap();
        std::fs::write(dir.path().join("pages/about.json"), r#"{"title":"About"}"#).unwrap();
        std::fs::write(dir.path().join("pages/contact.json"), "{}").unwrap();
        dir
    }

    #[test]
    fn node_paths() {
        assert_eq!(DataHandler::node_path("/data/ns/v1/pages.json").as_deref(), Some("pages"));
        assert_eq!(DataHandler::node_path("/data/ns/v1/a/b").as_deref(), Some("a/b"));
        assert_eq!(DataHandler::node_path("/data/ns/v1").as_deref(), Some(""));
        assert_eq!(DataHandler::node_path("/data/ns").as_deref(), None);
        assert_eq!(
            DataHandler::node_path("/data/ns/v1/../../../../etc/passwd").as_deref(),
            Some("")
        );
    }

    #[tokio::test]
    async fn data_with_children() {
        let dir = fixture();
        let handler = DataHandler::new(dir.path());

        let response = handler.serve("/data/ns/v1/pages.json").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public,max-age=86400");
        assert_eq!(
            json_of(response).await,
            serde_json::json!({
                "data": {"title": "Pages"},
                "children": [{"name": "about"}, {"name": "contact"}],
            })
        );
    }

    #[tokio::test]
    async fn leaf_without_directory() {
        let dir = fixture();
        let handler = DataHandler::new(dir.path());
        let body = json_of(handler.serve("/data/ns/v1/pages/contact").await).await;
        assert_eq!(body, serde_json::json!({"data": {}, "children": []}));
    }

    #[tokio::test]
    async fn directory_without_data() {
        let dir = fixture();
        let handler = DataHandler::new(dir.path());
        let body = json_of(handler.serve("/data/ns/v1/drafts").await).await;
        assert_eq!(body, serde_json::json!({"children": []}));
    }

    #[tokio::test]
    async fn missing_node_is_not_found() {
        let dir = fixture();
        let handler = DataHandler::new(dir.path());
        assert_eq!(
            handler.serve("/data/ns/v1/nothing").await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(handler.serve("/data/ns").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_json_is_a_server_error() {
        let dir = fixture();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let handler = DataHandler::new(dir.path());
        assert_eq!(
            handler.serve("/data/ns/v1/broken").await.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
