//! Error handling for the portsweep scanner
//!
//! Fatal errors abort a run before any probe is scheduled. Per-port failures
//! never show up here; they are carried as [`crate::network::ProbeOutcome`]
//! values so one bad port cannot stop the rest of the scan.

use thiserror::Error;

/// Main error type for scanning operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Unable to resolve host '{host}': {reason}")]
    HostResolution { host: String, reason: String },

    #[error("Invalid port range {start}-{end}: ports must satisfy 1 <= start <= end <= 65535")]
    InvalidRange { start: u32, end: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Host {0} is unreachable")]
    HostUnreachable(std::net::IpAddr),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Scan interrupted by user")]
    Interrupted,

    #[error("Concurrency limiter closed")]
    LimiterClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    /// Errors that stop the run before any port is probed
    pub fn is_fatal_before_scan(&self) -> bool {
        matches!(
            self,
            ScanError::HostResolution { .. }
                | ScanError::InvalidRange { .. }
                | ScanError::InvalidInput(_)
                | ScanError::HostUnreachable(_)
                | ScanError::ConfigError(_)
        )
    }
}

impl From<std::num::ParseIntError> for ScanError {
    fn from(e: std::num::ParseIntError) -> Self {
        ScanError::InvalidInput(e.to_string())
    }
}

impl From<std::net::AddrParseError> for ScanError {
    fn from(e: std::net::AddrParseError) -> Self {
        ScanError::InvalidInput(e.to_string())
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(e: toml::de::Error) -> Self {
        ScanError::ConfigError(format!("Failed to parse TOML: {}", e))
    }
}

impl From<tokio::sync::AcquireError> for ScanError {
    fn from(_: tokio::sync::AcquireError) -> Self {
        ScanError::LimiterClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_error_message_names_bounds() {
        let err = ScanError::InvalidRange {
            start: 100,
            end: 50,
        };
        let msg = err.to_string();
        assert!(msg.contains("100-50"));
        assert!(msg.contains("65535"));
    }

    #[test]
    fn test_parse_int_error_becomes_invalid_input() {
        let err: ScanError = "eighty".parse::<u32>().unwrap_err().into();
        assert!(matches!(err, ScanError::InvalidInput(_)));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ScanError::InvalidRange { start: 0, end: 1 }.is_fatal_before_scan());
        assert!(ScanError::HostResolution {
            host: "nope".to_string(),
            reason: "no addresses".to_string(),
        }
        .is_fatal_before_scan());
        assert!(!ScanError::Interrupted.is_fatal_before_scan());
        assert!(!ScanError::LimiterClosed.is_fatal_before_scan());
    }
}
