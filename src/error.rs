//! Process-level errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::reload::BuildError;
use crate::routing::MappingError;

/// Anything that ends the process with a non-zero status.
#[derive(Debug, Error)]
pub enum DevError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("cannot change directory to {}: {source}", path.display())]
    Chdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("invalid listen address {0:?}")]
    Address(String),

    #[error("cannot listen on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("{0} task error(s) reported")]
    Reported(usize),
}
