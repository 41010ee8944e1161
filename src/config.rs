//! Configuration module for the portsweep scanner

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default number of probes allowed in flight at once
pub const DEFAULT_CONCURRENCY: usize = 500;

/// Default per-port connect timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// Main configuration structure for scanning operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum number of probes holding a permit at any instant
    pub concurrency: usize,

    /// Timeout for each connection attempt in milliseconds
    pub timeout: u64,

    /// Port used by the pre-flight reachability probe
    pub reachability_port: u16,

    /// Timeout for the pre-flight reachability probe in milliseconds
    pub reachability_timeout: u64,

    /// Skip the pre-flight reachability probe
    pub skip_reachability: bool,

    /// Print each open port as soon as it is found
    pub realtime_notifications: bool,

    /// Read the system services file on top of the built-in service table
    pub system_services: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT_MS,
            reachability_port: 80,
            reachability_timeout: 1000,
            skip_reachability: false,
            realtime_notifications: true,
            system_services: true,
        }
    }
}

impl ScanConfig {
    /// Set the concurrency limit
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the per-port timeout in milliseconds
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_realtime_notifications(mut self, enabled: bool) -> Self {
        self.realtime_notifications = enabled;
        self
    }

    pub fn with_skip_reachability(mut self, skip: bool) -> Self {
        self.skip_reachability = skip;
        self
    }

    pub fn with_system_services(mut self, enabled: bool) -> Self {
        self.system_services = enabled;
        self
    }

    /// Get timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Get the reachability timeout as Duration
    pub fn reachability_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.reachability_timeout)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::ScanError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: ScanConfig = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from `~/.portsweep.toml`, falling back to defaults
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let config_path = home_dir.join(".portsweep.toml");

        if config_path.exists() {
            match Self::from_toml_file(&config_path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    return config;
                }
                Err(e) => {
                    log::warn!("Ignoring {}: {}", config_path.display(), e);
                }
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.concurrency == 0 {
            return Err(crate::ScanError::ConfigError(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.timeout == 0 {
            return Err(crate::ScanError::ConfigError(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.reachability_port == 0 {
            return Err(crate::ScanError::ConfigError(
                "Reachability port must be between 1 and 65535".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.concurrency, 500);
        assert_eq!(config.timeout_duration(), Duration::from_millis(500));
        assert_eq!(config.reachability_port, 80);
        assert_eq!(config.reachability_timeout_duration(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ScanConfig::default().with_concurrency(0);
        assert!(matches!(
            config.validate(),
            Err(crate::ScanError::ConfigError(_))
        ));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "concurrency = 64\ntimeout = 250").unwrap();

        let config = ScanConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.concurrency, 64);
        assert_eq!(config.timeout, 250);
        assert_eq!(config.reachability_port, 80);
        assert!(config.realtime_notifications);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "concurrency = \"lots\"").unwrap();

        assert!(matches!(
            ScanConfig::from_toml_file(file.path()),
            Err(crate::ScanError::ConfigError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = ScanConfig::from_toml_file("/definitely/not/here/portsweep.toml");
        assert!(matches!(result, Err(crate::ScanError::ConfigError(_))));
    }
}
