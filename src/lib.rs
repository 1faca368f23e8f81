//! Local development server for single-page web apps.
//!
//! Serves entry pages with an injected bootstrap script, versioned assets, a
//! JSON data tree, and reverse proxies, and rebuilds all of it whenever a file
//! it was built from changes.

pub mod app;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reload;
pub mod routing;

pub use app::AppBuilder;
pub use config::DevConfig;
pub use error::DevError;
pub use http::DevServer;
pub use lifecycle::Shutdown;
pub use reload::{HandlerRegistry, ReloadSupervisor};
