//! Scanner module containing the scan engine and its result types

pub mod engine;
pub mod limiter;

use crate::network::ProbeOutcome;
use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub use engine::ScanEngine;
pub use limiter::{ConcurrencyLimiter, PermitToken};

/// An open port and the name it is conventionally known by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPort {
    pub port: u16,
    pub service: String,
}

/// A port whose probe failed for an unexpected local reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub port: u16,
    pub cause: String,
}

/// Counters describing how a scan went
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Ports in the requested range
    pub requested: usize,
    /// Ports that reached a terminal outcome
    pub probed: usize,
    pub open: usize,
    pub closed: usize,
    pub errored: usize,
    /// Ports never probed or cut off by an interrupt
    pub abandoned: usize,
    /// Highest number of probes in flight at once
    pub peak_in_flight: usize,
}

/// Final, read-only report of one scan. Ports are in ascending order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub target: Target,
    pub open_ports: Vec<OpenPort>,
    pub errors: Vec<ProbeFailure>,
    pub duration: Duration,
    pub interrupted: bool,
    pub stats: ScanStats,
}

impl ScanResult {
    pub fn open_port_numbers(&self) -> Vec<u16> {
        self.open_ports.iter().map(|p| p.port).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.open_ports.is_empty()
    }

    /// Scan rate in ports per second
    pub fn scan_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.stats.probed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Mutable aggregate owned by the engine while a scan runs.
///
/// Outcomes arrive in completion order and are keyed by port, so the frozen
/// result comes out sorted no matter which probe finished first.
#[derive(Debug)]
pub(crate) struct ResultCollector {
    target: Target,
    open: BTreeMap<u16, String>,
    errors: BTreeMap<u16, String>,
    stats: ScanStats,
}

impl ResultCollector {
    pub(crate) fn new(target: Target) -> Self {
        let stats = ScanStats {
            requested: target.ports.len(),
            ..Default::default()
        };

        Self {
            target,
            open: BTreeMap::new(),
            errors: BTreeMap::new(),
            stats,
        }
    }

    pub(crate) fn record(&mut self, outcome: ProbeOutcome) {
        self.stats.probed += 1;

        match outcome {
            ProbeOutcome::Open { port, service } => {
                self.stats.open += 1;
                let service =
                    service.unwrap_or_else(|| crate::network::UNKNOWN_SERVICE.to_string());
                self.open.insert(port, service);
            }
            ProbeOutcome::Closed { .. } => {
                self.stats.closed += 1;
            }
            ProbeOutcome::Errored { port, cause } => {
                self.stats.errored += 1;
                self.errors.insert(port, cause);
            }
        }
    }

    pub(crate) fn finish(
        mut self,
        duration: Duration,
        interrupted: bool,
        peak_in_flight: usize,
    ) -> ScanResult {
        self.stats.abandoned = self.stats.requested.saturating_sub(self.stats.probed);
        self.stats.peak_in_flight = peak_in_flight;

        ScanResult {
            target: self.target,
            open_ports: self
                .open
                .into_iter()
                .map(|(port, service)| OpenPort { port, service })
                .collect(),
            errors: self
                .errors
                .into_iter()
                .map(|(port, cause)| ProbeFailure { port, cause })
                .collect(),
            duration,
            interrupted,
            stats: self.stats,
        }
    }
}
