//! Startup orchestration.
//!
//! # Responsibilities
//! - Apply positional arguments: directory changes, then mappings
//! - Bind the listener for the resolved address
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Directory changes happen once, before the first build, in argument order

use std::path::Path;

use tokio::net::TcpListener;

use crate::discovery::BindDescriptor;
use crate::error::DevError;
use crate::routing::{default_mappings, parse_arguments, Argument, Mapping};

/// Split arguments into mappings, changing directory for every bare argument.
///
/// Falls back to `/` → `index.html` when no mapping is given.
pub fn apply_arguments<S: AsRef<str>>(args: &[S]) -> Result<Vec<Mapping>, DevError> {
    let mut mappings = Vec::new();
    for argument in parse_arguments(args)? {
        match argument {
            Argument::Map(mapping) => mappings.push(mapping),
            Argument::Chdir(dir) => change_dir(&dir)?,
        }
    }
    if mappings.is_empty() {
        mappings = default_mappings();
    }
    Ok(mappings)
}

fn change_dir(dir: &Path) -> Result<(), DevError> {
    std::env::set_current_dir(dir).map_err(|source| DevError::Chdir {
        path: dir.to_path_buf(),
        source,
    })?;
    tracing::debug!(dir = %dir.display(), "Changed working directory");
    Ok(())
}

/// Bind a TCP listener for `bind`.
pub async fn bind_listener(bind: &BindDescriptor) -> Result<TcpListener, DevError> {
    let addr = bind
        .socket_addr()
        .map_err(|_| DevError::Address(bind.address.clone()))?;
    TcpListener::bind(addr).await.map_err(|source| DevError::Bind {
        address: bind.address.clone(),
        source,
    })
}
