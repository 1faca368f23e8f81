//! First-to-finish arbitration over the bind probes.

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::BindConfig;
use crate::discovery::probes::{self, Probe};
use crate::discovery::{BindDescriptor, BindEnv};

/// Races the environment probes and the delayed fallback.
#[derive(Debug, Clone)]
pub struct BindResolver {
    config: BindConfig,
    env: BindEnv,
    client: reqwest::Client,
}

impl BindResolver {
    pub fn new(config: BindConfig, env: BindEnv) -> Self {
        Self {
            config,
            env,
            client: reqwest::Client::new(),
        }
    }

    /// Resolve the listen address.
    ///
    /// Returns `None` only when `shutdown` fires before any probe answers.
    pub async fn resolve(&self, shutdown: &CancellationToken) -> Option<BindDescriptor> {
        let mut probes = self.spawn_probes();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Bind resolution cancelled");
                    return None;
                }
                joined = probes.join_next() => match joined {
                    Some(Ok(Some((probe, bind)))) => {
                        tracing::info!(
                            probe = %probe,
                            address = %bind.address,
                            host = %bind.host,
                            "Bind address resolved"
                        );
                        // Dropping the set aborts the probes still running.
                        return Some(bind);
                    }
                    Some(Ok(None)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Bind probe crashed");
                        continue;
                    }
                    None => return None,
                },
            }
        }
    }

    fn spawn_probes(&self) -> JoinSet<Option<(Probe, BindDescriptor)>> {
        let mut set = JoinSet::new();

        let env = self.env.clone();
        let endpoint = self.config.discovery_endpoint.clone();
        let client = self.client.clone();
        set.spawn(async move {
            probes::container(&env, &endpoint, &client)
                .await
                .map(|b| (Probe::Container, b))
        });

        let env = self.env.clone();
        set.spawn(async move { probes::local(&env).map(|b| (Probe::Local, b)) });

        let env = self.env.clone();
        set.spawn(async move { probes::hosted(&env).map(|b| (Probe::Hosted, b)) });

        let config = self.config.clone();
        set.spawn(async move { Some((Probe::Fallback, probes::fallback(&config).await)) });

        set
    }
}
