//! One generation of handler plus the files it was built from.

use std::path::PathBuf;

use axum::Router;
use thiserror::Error;

use crate::reload::watcher::Snapshot;

/// A freshly built handler and the files whose change invalidates it.
#[derive(Debug)]
pub struct HandlerSession {
    pub handler: Router,
    /// Paths read during construction, in mapping order, each with the
    /// snapshot taken before it was read.
    pub watch_set: Vec<(PathBuf, Snapshot)>,
}

/// Failure to construct a handler. Always fatal.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cannot read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("prefix {0} is mapped more than once")]
    DuplicatePrefix(String),

    #[error("handler build did not finish: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

/// Constructs handler sessions on demand.
///
/// `build` may block on file reads; the supervisor runs it on the blocking pool.
pub trait SessionBuilder: Send + Sync + 'static {
    fn build(&self) -> Result<HandlerSession, BuildError>;
}

impl<F> SessionBuilder for F
where
    F: Fn() -> Result<HandlerSession, BuildError> + Send + Sync + 'static,
{
    fn build(&self) -> Result<HandlerSession, BuildError> {
        self()
    }
}
