//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DevConfig (validated, immutable)
//!     → cloned into the resolver, the supervisor and the session builder
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only mapped files and the always-watched
//!   files trigger reloads, never the config file itself
//! - All fields have defaults so the server runs with no config file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{BindConfig, DevConfig, ObservabilityConfig, ServeConfig, WatchConfig};
