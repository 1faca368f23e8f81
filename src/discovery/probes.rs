//! Environment probes.
//!
//! Each probe decides on its own whether it applies. A probe that does not
//! apply, or fails, answers `None`; the resolver simply keeps waiting for the
//! others.

use std::fmt;

use serde::Deserialize;

use crate::config::BindConfig;
use crate::discovery::{BindDescriptor, BindEnv};

/// Identifies which probe produced a descriptor, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Container,
    Local,
    Hosted,
    Fallback,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Probe::Container => "container",
            Probe::Local => "local",
            Probe::Hosted => "hosted",
            Probe::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Answer of the discovery endpoint for one container.
#[derive(Debug, Deserialize)]
struct ContainerInfo {
    #[serde(rename = "Name", alias = "name")]
    name: String,
    #[serde(rename = "Image", alias = "image")]
    image: String,
}

/// Look the container up in the local discovery service.
pub async fn container(
    env: &BindEnv,
    endpoint: &str,
    client: &reqwest::Client,
) -> Option<BindDescriptor> {
    if !env.use_dnsdock {
        return None;
    }

    let url = format!("{}{}", endpoint, env.hostname);
    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "Container discovery unreachable");
            return None;
        }
    };

    if response.status() != reqwest::StatusCode::OK {
        tracing::debug!(url = %url, status = %response.status(), "Container discovery refused");
        return None;
    }

    match response.json::<ContainerInfo>().await {
        Ok(info) => Some(BindDescriptor::new(
            ":80",
            format!("{}.{}.docker", info.name, info.image),
        )),
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "Container discovery answer malformed");
            None
        }
    }
}

/// `PORT` on a developer machine.
pub fn local(env: &BindEnv) -> Option<BindDescriptor> {
    if env.use_dnsdock || env.dyno.is_some() {
        return None;
    }
    let port = env.port.as_ref()?;
    Some(BindDescriptor::new(
        format!(":{port}"),
        format!("localhost:{port}"),
    ))
}

/// `PORT` on a hosted dyno.
pub fn hosted(env: &BindEnv) -> Option<BindDescriptor> {
    if env.use_dnsdock || env.dyno.is_none() {
        return None;
    }
    let port = env.port.as_ref()?;
    Some(BindDescriptor::new(
        format!(":{port}"),
        format!("0.0.0.0:{port}"),
    ))
}

/// Always answers, after the configured delay.
pub async fn fallback(config: &BindConfig) -> BindDescriptor {
    tokio::time::sleep(config.fallback_delay()).await;
    BindDescriptor::new(
        config.fallback_address.clone(),
        config.fallback_host.clone(),
    )
}
