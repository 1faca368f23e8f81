//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! CLI arguments
//!     → mapping.rs (prefix=target | directory)
//!     → matcher.rs (normalise prefixes, clean paths)
//!     → router.rs (longest-prefix table, rebuilt on every reload)
//!
//! Incoming request path
//!     → router.rs lookup
//!     → Found(mount) | Redirect(prefix/) | NotFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled per handler session, immutable while it serves
//! - No regex in the hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod mapping;
pub mod matcher;
pub mod router;

pub use mapping::{default_mappings, parse_arguments, Argument, Mapping, MappingError, Target};
pub use matcher::{clean_path, normalize_prefix};
pub use router::{PrefixRouter, RouteMatch};
