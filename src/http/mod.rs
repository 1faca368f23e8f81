//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → HandlerRegistry (current handler, swapped on reload)
//!     → app.rs mux (longest mapped prefix)
//!         /asset/ → assets.rs (versioned static files)
//!         /data/  → data.rs (JSON tree)
//!         page    → bootloader.rs + template.rs (entry page)
//!         proxy   → proxy.rs (upstream)
//!     → response.rs helpers
//! ```

pub mod assets;
pub mod bootloader;
pub mod data;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod template;

pub use assets::AssetHandler;
pub use bootloader::{boot_hash, Bootloader};
pub use data::DataHandler;
pub use proxy::Proxy;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::DevServer;
pub use template::Template;
