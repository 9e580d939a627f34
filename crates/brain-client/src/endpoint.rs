//! Base address of the Brain service.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;

/// Port the Brain listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 8420;

/// Default base endpoint (loopback, default port).
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8420";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid Brain endpoint '{url}': {reason}")]
pub struct EndpointError {
    pub url: String,
    pub reason: String,
}

/// Scheme, host and port of the Brain.
///
/// Always a valid absolute `http`/`https` address. Replaced wholesale, never
/// edited in place, so a snapshot taken for one exchange stays consistent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: u16,
}

fn scheme_default_port(scheme: &str) -> u16 {
    if scheme == "https" {
        443
    } else {
        80
    }
}

impl Endpoint {
    /// Parse an absolute URL. Any path, query or fragment is dropped.
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let invalid = |reason: String| EndpointError {
            url: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(invalid(format!("unsupported scheme '{}'", scheme)));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host".to_string()))?;

        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port".to_string()))?;

        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port,
        })
    }

    /// Loopback endpoint on the given port.
    pub fn loopback(port: u16) -> Self {
        Self {
            scheme: "http".to_string(),
            host: "127.0.0.1".to_string(),
            port,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port requests go to. An address without one uses its scheme's port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Port that rediscovery scans upward from. A scheme-default port says
    /// nothing about where the Brain was meant to run, so [`DEFAULT_PORT`]
    /// stands in for it.
    pub fn discovery_base_port(&self) -> u16 {
        if self.port == scheme_default_port(&self.scheme) {
            DEFAULT_PORT
        } else {
            self.port
        }
    }

    /// Same scheme and host on another port.
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            port,
        }
    }

    /// Absolute URL for a request path (e.g. `/health`).
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self, path)
        } else {
            format!("{}/{}", self, path)
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::loopback(DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if self.port != scheme_default_port(&self.scheme) {
            write!(f, ":{}", self.port)?;
        }
        Ok(())
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
