//! Reload supervisor.
//!
//! # States
//! - Building: build a session, start its watchers, publish its handler
//! - Serving: forward watcher errors until the watcher set completes
//!
//! # State Transitions
//! ```text
//! Building → Serving: session built, watchers baselined, handler published
//! Serving → Building: watcher set closed cleanly (a watched file changed)
//! Serving → stopped:  shutdown cancelled (remaining errors drained)
//! Building → failed:  construction error, returned to the caller
//! Building → stopped: shutdown cancelled mid-build (nothing published)
//! ```
//!
//! # Design Decisions
//! - Every baseline is taken before the file it covers is read, so an edit
//!   racing the build always triggers another one
//! - The build runs on the blocking pool; it reads files synchronously
//! - Errors from the set are forwarded and the session keeps serving
//! - No retry on construction errors; a broken mapping needs a human

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::WatchConfig;
use crate::reload::registry::HandlerRegistry;
use crate::reload::session::{BuildError, HandlerSession, SessionBuilder};
use crate::reload::tasks::{forward, run_set, ErrorSender, ErrorStream, Task};
use crate::reload::watcher::FileWatcher;

/// Owns the build → publish → watch loop.
pub struct ReloadSupervisor<B> {
    registry: Arc<HandlerRegistry>,
    builder: Arc<B>,
    config: WatchConfig,
}

impl<B: SessionBuilder> ReloadSupervisor<B> {
    pub fn new(registry: Arc<HandlerRegistry>, builder: B, config: WatchConfig) -> Self {
        Self {
            registry,
            builder: Arc::new(builder),
            config,
        }
    }

    /// Run until `shutdown` is cancelled or a session fails to build.
    ///
    /// Genuine task errors go to `sink`; they never stop the loop.
    pub async fn run(self, shutdown: CancellationToken, sink: ErrorSender) -> Result<(), BuildError> {
        let mut generation: u64 = 0;

        while !shutdown.is_cancelled() {
            if generation > 0 {
                tracing::info!("reloading...");
            }
            generation += 1;

            let mut errors = self.start_session(&shutdown, generation).await?;

            let cancelled = loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break true,
                    next = errors.recv() => match next {
                        Some(err) => forward(&sink, err).await,
                        None => break false,
                    },
                }
            };

            if cancelled {
                while let Some(err) = errors.recv().await {
                    forward(&sink, err).await;
                }
            }
        }

        tracing::info!(generations = generation, "Reload supervisor stopped");
        Ok(())
    }

    async fn start_session(
        &self,
        shutdown: &CancellationToken,
        generation: u64,
    ) -> Result<ErrorStream, BuildError> {
        let interval = self.config.poll_interval();
        let mut watchers: Vec<Box<dyn Task>> = Vec::new();
        for path in &self.config.always {
            watchers.push(Box::new(FileWatcher::start(path.clone(), interval).await));
        }

        let builder = self.builder.clone();
        let HandlerSession { handler, watch_set } =
            tokio::task::spawn_blocking(move || builder.build()).await??;

        for (path, baseline) in watch_set {
            watchers.push(Box::new(FileWatcher::with_baseline(path, baseline, interval)));
        }
        let watched = watchers.len();
        let errors = run_set(shutdown, watchers);

        if shutdown.is_cancelled() {
            tracing::debug!(generation, "Shutdown during build, handler not published");
            return Ok(errors);
        }
        self.registry.set(handler);
        tracing::info!(generation, watched, "Handler published");

        Ok(errors)
    }
}
