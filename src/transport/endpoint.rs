//! Resolved broker address.

use crate::error::{Result, WireError};
use std::fmt;
use std::net::SocketAddr;

/// A broker host together with the socket address it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    addr: SocketAddr,
}

impl Endpoint {
    /// Resolve `host`, preferring an IPv4 address when the name has several.
    pub async fn resolve(host: &str, port: u16) -> Result<Self> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(|_| WireError::UnresolvedHostname(host.to_string()))?
            .collect();
        let addr = addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| WireError::UnresolvedHostname(host.to_string()))?;
        Ok(Self {
            host: host.to_string(),
            addr,
        })
    }

    pub fn from_addr(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip().to_string(),
            addr,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.addr.port())
    }
}
