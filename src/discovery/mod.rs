//! Listen address discovery subsystem.
//!
//! # Data Flow
//! ```text
//! process environment (USE_DNSDOCK, HOSTNAME, DYNO, PORT)
//!     → BindEnv (snapshot, read once)
//!     → resolver.rs races four probes:
//!         - probes::container (dnsdock lookup, opt-in)
//!         - probes::local     (PORT on a workstation)
//!         - probes::hosted    (PORT on a hosted dyno)
//!         - probes::fallback  (fixed address after a delay)
//!     → first answer wins → BindDescriptor
//! ```
//!
//! # Design Decisions
//! - Guards of the three environment probes are mutually exclusive, so
//!   first-to-finish is enough arbitration; the fallback delay makes any
//!   applicable environment probe win
//! - Losing probes are aborted once a winner is known

pub mod probes;
pub mod resolver;

use std::fmt;
use std::net::{AddrParseError, SocketAddr};

pub use resolver::BindResolver;

/// Opt-in flag for the container discovery probe.
pub const ENV_USE_DNSDOCK: &str = "USE_DNSDOCK";
/// Container host name, used as the discovery lookup key.
pub const ENV_HOSTNAME: &str = "HOSTNAME";
/// Marker set by the hosted platform on every dyno.
pub const ENV_DYNO: &str = "DYNO";
/// Port to listen on.
pub const ENV_PORT: &str = "PORT";

/// The resolved listen address and externally visible host name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindDescriptor {
    /// Listen address, either `host:port` or `:port` (all interfaces).
    pub address: String,
    /// Host name clients use to reach the server.
    pub host: String,
}

impl BindDescriptor {
    pub fn new(address: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            host: host.into(),
        }
    }

    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        listen_addr(&self.address)
    }
}

impl fmt::Display for BindDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (http://{}/)", self.address, self.host)
    }
}

/// Parse a listen address, treating a bare `:port` as every IPv4 interface.
pub fn listen_addr(address: &str) -> Result<SocketAddr, AddrParseError> {
    match address.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}").parse(),
        None => address.parse(),
    }
}

/// Snapshot of the environment variables the probes consult.
///
/// Empty values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindEnv {
    pub use_dnsdock: bool,
    pub hostname: String,
    pub dyno: Option<String>,
    pub port: Option<String>,
}

impl BindEnv {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            use_dnsdock: lookup(ENV_USE_DNSDOCK).as_deref() == Some("true"),
            hostname: lookup(ENV_HOSTNAME).unwrap_or_default(),
            dyno: non_empty(ENV_DYNO),
            port: non_empty(ENV_PORT),
        }
    }
}
