//! Network module: single-port probing, service names and reachability

pub mod probe;
pub mod reachability;
pub mod services;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use probe::{ConnectionProbe, TcpConnectProbe};
pub use reachability::check_reachable;
pub use services::{ServiceDatabase, UNKNOWN_SERVICE};

/// Terminal outcome of one probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ProbeOutcome {
    /// Connection completed within the timeout
    Open { port: u16, service: Option<String> },
    /// Refused, unreachable, reset or timed out
    Closed { port: u16 },
    /// Something unexpected went wrong locally, e.g. file descriptor exhaustion
    Errored { port: u16, cause: String },
}

impl ProbeOutcome {
    pub fn port(&self) -> u16 {
        match self {
            ProbeOutcome::Open { port, .. }
            | ProbeOutcome::Closed { port }
            | ProbeOutcome::Errored { port, .. } => *port,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ProbeOutcome::Open { .. })
    }

    /// Attach a service name to an open outcome; other outcomes pass through
    pub fn with_service(self, service: String) -> Self {
        match self {
            ProbeOutcome::Open { port, .. } => ProbeOutcome::Open {
                port,
                service: Some(service),
            },
            other => other,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Open { port, service } => match service {
                Some(name) => write!(f, "{}: open ({})", port, name),
                None => write!(f, "{}: open", port),
            },
            ProbeOutcome::Closed { port } => write!(f, "{}: closed", port),
            ProbeOutcome::Errored { port, cause } => write!(f, "{}: error ({})", port, cause),
        }
    }
}
