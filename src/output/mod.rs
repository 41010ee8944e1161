//! Output formatting for scan reports

use crate::network::UNKNOWN_SERVICE;
use crate::scanner::ScanResult;
use colored::*;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::net::IpAddr;

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub colored: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            colored: true,
        }
    }
}

/// Renders finished scans
pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Write scan results to stdout
    pub fn write_results(&self, results: &ScanResult) -> io::Result<()> {
        let output = self.render(results)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()
    }

    pub fn render(&self, results: &ScanResult) -> io::Result<String> {
        match self.config.format {
            OutputFormat::Text => Ok(self.format_text(results)),
            OutputFormat::Json => self.format_json(results),
        }
    }

    fn format_text(&self, results: &ScanResult) -> String {
        let mut output = String::new();

        if results.open_ports.is_empty() {
            output.push_str(&self.colorize("No open ports found.", "yellow"));
            output.push('\n');
        } else {
            let heading = format!("Open ports on {}:", results.target.ip);
            output.push_str(&self.colorize(&heading, "bold"));
            output.push('\n');
            for open in &results.open_ports {
                let line = format!("Port {}: OPEN ({})", open.port, open.service);
                output.push_str(&self.colorize(&line, "green"));
                output.push('\n');
            }
        }

        for failure in &results.errors {
            let line = format!("Error scanning port {}: {}", failure.port, failure.cause);
            output.push_str(&self.colorize(&line, "red"));
            output.push('\n');
        }

        if results.interrupted {
            let line = format!(
                "Partial results: {} of {} ports probed.",
                results.stats.probed, results.stats.requested
            );
            output.push_str(&self.colorize(&line, "yellow"));
            output.push('\n');
        }

        output.push_str(&format!("Time taken: {:.2}s\n", results.duration.as_secs_f64()));
        output
    }

    fn format_json(&self, results: &ScanResult) -> io::Result<String> {
        let mut json = serde_json::to_string_pretty(results)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        json.push('\n');
        Ok(json)
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.config.colored {
            return text.to_string();
        }

        match color {
            "green" => text.bright_green().to_string(),
            "yellow" => text.bright_yellow().to_string(),
            "red" => text.bright_red().to_string(),
            "bold" => text.bold().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Real-time notice for an open port found mid-scan
pub fn notify_open(ip: IpAddr, port: u16, service: Option<&str>) {
    let service = service.unwrap_or(UNKNOWN_SERVICE);
    println!(
        "{}",
        format!("OPEN: {}:{} ({})", ip, port, service).truecolor(255, 135, 0)
    );
}
