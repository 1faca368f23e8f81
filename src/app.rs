//! Handler construction for one reload generation.
//!
//! Every build draws a new boot hash, re-reads every mapped entry page, and
//! mounts the fixed `/asset/` and `/data/` trees next to the user mappings.
//! Request paths are cleaned before matching; an unclean path is redirected
//! to its cleaned form.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::Response;
use axum::Router;

use crate::config::ServeConfig;
use crate::http::response::{moved_permanently, not_found};
use crate::http::{boot_hash, AssetHandler, Bootloader, DataHandler, Proxy};
use crate::reload::{BuildError, HandlerSession, SessionBuilder};
use crate::routing::{clean_path, Mapping, PrefixRouter, RouteMatch, Target};

/// What a prefix is mounted to.
#[derive(Debug)]
enum Mount {
    Page(Bootloader),
    Proxy(Proxy),
    Assets(AssetHandler),
    Data(DataHandler),
}

impl Mount {
    async fn handle(&self, request: Request<Body>) -> Response {
        match self {
            Mount::Page(page) => page.respond(request.headers()),
            Mount::Proxy(proxy) => proxy.forward(request).await,
            Mount::Assets(assets) => assets.serve(request).await,
            Mount::Data(data) => data.serve(request.uri().path()).await,
        }
    }
}

/// Builds the mux for a fixed set of mappings.
#[derive(Debug, Clone)]
pub struct AppBuilder {
    mappings: Vec<Mapping>,
    serve: ServeConfig,
    client: reqwest::Client,
}

impl AppBuilder {
    pub fn new(mappings: Vec<Mapping>, serve: ServeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            mappings,
            serve,
            client,
        })
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }
}

impl SessionBuilder for AppBuilder {
    fn build(&self) -> Result<HandlerSession, BuildError> {
        let hash = boot_hash();
        let mut mux = PrefixRouter::new();
        let mut watch_set = Vec::new();

        mux.insert("/asset/", Mount::Assets(AssetHandler::new(&self.serve.assets_dir)))
            .map_err(BuildError::DuplicatePrefix)?;
        mux.insert("/data/", Mount::Data(DataHandler::new(&self.serve.data_dir)))
            .map_err(BuildError::DuplicatePrefix)?;

        for mapping in &self.mappings {
            let mount = match &mapping.target {
                Target::File(path) => {
                    tracing::info!(prefix = %mapping.prefix, file = %path.display(), "mapped");
                    let (page, baseline) = Bootloader::load(path, &hash, &self.serve)?;
                    watch_set.push((path.clone(), baseline));
                    Mount::Page(page)
                }
                Target::Proxy(url) => {
                    tracing::info!(prefix = %mapping.prefix, target = %url, "forwarding");
                    Mount::Proxy(Proxy::new(url.clone(), &mapping.prefix, self.client.clone()))
                }
            };
            mux.insert(&mapping.prefix, mount)
                .map_err(BuildError::DuplicatePrefix)?;
        }

        tracing::debug!(hash = %hash, routes = mux.len(), "Handler built");

        let handler = Router::new().fallback(dispatch).with_state(Arc::new(mux));
        Ok(HandlerSession { handler, watch_set })
    }
}

/// The cleaned form of a request path, keeping a trailing slash.
fn canonical_path(path: &str) -> String {
    let mut cleaned = clean_path(path);
    if path.ends_with('/') && cleaned != "/" {
        cleaned.push('/');
    }
    cleaned
}

fn redirect_to(location: &str, query: Option<&str>) -> Response {
    match query {
        Some(query) => moved_permanently(&format!("{location}?{query}")),
        None => moved_permanently(location),
    }
}

async fn dispatch(State(mux): State<Arc<PrefixRouter<Mount>>>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();
    let canonical = canonical_path(&path);
    if canonical != path {
        return redirect_to(&canonical, request.uri().query());
    }
    match mux.match_path(&path) {
        RouteMatch::Found { route, .. } => route.handle(request).await,
        RouteMatch::Redirect(prefix) => redirect_to(&prefix, request.uri().query()),
        RouteMatch::NotFound => not_found(),
    }
}
