//! portsweep - bounded-concurrency TCP connect port scanner
//!
//! A [`ScanEngine`] expands a port range, runs one connect probe per port
//! under a fixed-capacity [`ConcurrencyLimiter`], and returns a [`ScanResult`]
//! with the open ports in ascending order.

pub mod config;
pub mod error;
pub mod network;
pub mod output;
pub mod scanner;
pub mod target;

// Re-export commonly used types
pub use config::ScanConfig;
pub use error::ScanError;
pub use network::{ConnectionProbe, ProbeOutcome, ServiceDatabase, TcpConnectProbe};
pub use scanner::{ConcurrencyLimiter, OpenPort, ScanEngine, ScanResult};
pub use target::{resolve_host, PortRange, Target};

pub type Result<T> = std::result::Result<T, ScanError>;
