//! Scan targets: host resolution, numeric input parsing and port ranges

use crate::ScanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::ops::RangeInclusive;

/// Inclusive port range, validated on construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    /// Build a range from raw user numbers.
    ///
    /// Takes `u32` so values such as 0 or 70000 reach the range check
    /// instead of failing earlier as a parse error.
    pub fn new(start: u32, end: u32) -> crate::Result<Self> {
        if start < 1 || end > u16::MAX as u32 || start > end {
            return Err(ScanError::InvalidRange { start, end });
        }

        Ok(Self {
            start: start as u16,
            end: end as u16,
        })
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    /// Number of ports in the range
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    /// A validated range always holds at least one port
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Ports in ascending order
    pub fn iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A resolved host plus the ports to scan on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Host as the user typed it
    pub host: String,
    pub ip: IpAddr,
    pub ports: PortRange,
}

impl Target {
    pub fn new(host: impl Into<String>, ip: IpAddr, ports: PortRange) -> Self {
        Self {
            host: host.into(),
            ip,
            ports,
        }
    }

    /// Target for an IP literal, with the IP doubling as the host name
    pub fn from_ip(ip: IpAddr, ports: PortRange) -> Self {
        Self::new(ip.to_string(), ip, ports)
    }
}

/// Parse one port number typed by the user
pub fn parse_port_input(input: &str) -> crate::Result<u32> {
    let trimmed = input.trim();
    trimmed
        .parse::<u32>()
        .map_err(|_| ScanError::InvalidInput(format!("'{}' is not a port number", trimmed)))
}

/// Resolve a hostname or IP literal to a single address, preferring IPv4
pub async fn resolve_host(host: &str) -> crate::Result<IpAddr> {
    let host = host.trim();
    if host.is_empty() {
        return Err(ScanError::HostResolution {
            host: String::new(),
            reason: "empty host".to_string(),
        });
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let addrs: Vec<IpAddr> = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| ScanError::HostResolution {
            host: host.to_string(),
            reason: e.to_string(),
        })?
        .map(|addr| addr.ip())
        .collect();

    log::debug!("{} resolved to {:?}", host, addrs);

    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| ScanError::HostResolution {
            host: host.to_string(),
            reason: "no addresses returned".to_string(),
        })
}
