//! Host-side policy: which destinations a guest may reach and how many
//! responses it may hold open at once.

use serde::Deserialize;
use url::Url;
use wasi_http_guest::HttpError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Origins the guest may call, e.g. `https://api.example.com`. `None`
    /// allows every host; an empty list allows none.
    pub allowed_hosts: Option<Vec<String>>,
    /// Maximum number of open response handles. `None` means no limit.
    pub max_concurrent_requests: Option<u32>,
}

/// `HostConfig` with the allowed origins parsed down to host names.
#[derive(Debug, Clone)]
pub(crate) struct Policy {
    allowed: Option<Vec<String>>,
    pub max_concurrent_requests: Option<u32>,
}

impl Policy {
    pub fn new(config: &HostConfig) -> Result<Self, HttpError> {
        let allowed = match &config.allowed_hosts {
            None => None,
            Some(origins) => {
                let mut hosts = Vec::with_capacity(origins.len());
                for origin in origins {
                    let url = Url::parse(origin).map_err(|e| {
                        HttpError::invalid_config(format!("allowed host {origin:?}: {e}"))
                    })?;
                    let host = url.host_str().ok_or_else(|| {
                        HttpError::invalid_config(format!("allowed host {origin:?} has no host"))
                    })?;
                    hosts.push(host.to_string());
                }
                Some(hosts)
            }
        };
        Ok(Self {
            allowed,
            max_concurrent_requests: config.max_concurrent_requests,
        })
    }

    pub fn is_allowed(&self, url: &Url) -> bool {
        match (&self.allowed, url.host_str()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(hosts), Some(host)) => hosts.iter().any(|h| h == host),
        }
    }
}
