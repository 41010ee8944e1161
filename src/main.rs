use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use std::io::{self, Write};
use std::process;
use tokio_util::sync::CancellationToken;

use portsweep::{
    config::ScanConfig,
    output::{OutputConfig, OutputFormat, OutputManager},
    target::{parse_port_input, resolve_host, PortRange, Target},
    ScanEngine, ScanError,
};

/// Exit status used when the user interrupts the run (128 + SIGINT)
const EXIT_INTERRUPTED: i32 = 130;

/// File descriptors kept free on top of the probe sockets
const FD_HEADROOM: u64 = 64;

fn build_cli() -> Command {
    Command::new("portsweep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Bounded-concurrency TCP connect port scanner")
        .arg(
            Arg::new("host")
                .value_name("HOST")
                .help("Host to scan (hostname or IP). Prompted for when omitted")
                .index(1),
        )
        .arg(
            Arg::new("start")
                .value_name("START")
                .help("First port of the range. Prompted for when omitted")
                .index(2),
        )
        .arg(
            Arg::new("end")
                .value_name("END")
                .help("Last port of the range. Prompted for when omitted")
                .index(3),
        )
        .arg(
            Arg::new("concurrency")
                .short('c')
                .long("concurrency")
                .value_name("N")
                .help("Maximum number of connection attempts in flight (default 500)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("MS")
                .help("Per-port connect timeout in milliseconds (default 500)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Load settings from a TOML file instead of ~/.portsweep.toml"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the final report as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-ping")
                .long("no-ping")
                .help("Skip the port 80 reachability check")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Do not announce open ports while the scan runs")
                .action(ArgAction::SetTrue),
        )
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let matches = build_cli().get_matches();

    if matches.get_flag("no-color") {
        colored::control::set_override(false);
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if cancel.is_cancelled() {
                    // Second interrupt: stop waiting for the graceful path.
                    eprintln!("\n{}", "Scan interrupted by user.".bright_yellow().bold());
                    process::exit(EXIT_INTERRUPTED);
                }
                log::debug!("Interrupt received");
                cancel.cancel();
            }
        });
    }

    if let Err(e) = run(&matches, cancel).await {
        let code = report_error(&e);
        process::exit(code);
    }
}

async fn run(matches: &ArgMatches, cancel: CancellationToken) -> portsweep::Result<()> {
    let config = build_config(matches)?;

    let start_arg = matches.get_one::<String>("start");
    let end_arg = matches.get_one::<String>("end");

    // A range given on the command line is checked before any lookup.
    let cli_ports = match (start_arg, end_arg) {
        (Some(start), Some(end)) => Some(parse_range(start, end)?),
        _ => None,
    };

    let host = match matches.get_one::<String>("host") {
        Some(host) => host.clone(),
        None => prompt_interruptible("Enter host for scanning: ", &cancel).await?,
    };
    let ip = resolve_host(&host).await?;

    let ports = match cli_ports {
        Some(ports) => ports,
        None => {
            let start = match start_arg {
                Some(start) => start.clone(),
                None => prompt_interruptible("Enter the start port: ", &cancel).await?,
            };
            let end = match end_arg {
                Some(end) => end.clone(),
                None => prompt_interruptible("Enter the end port: ", &cancel).await?,
            };
            parse_range(&start, &end)?
        }
    };

    let target = Target::new(host, ip, ports);
    adjust_ulimit_size(config.concurrency as u64 + FD_HEADROOM);

    let engine = ScanEngine::new(config)?;

    println!(
        "{} {}",
        "Start scanning on host:".bright_yellow().bold(),
        ip.to_string().bright_cyan().bold()
    );

    let result = engine.scan_if_reachable(&target, cancel).await?;

    if result.interrupted {
        eprintln!("\n{}", "Scan interrupted by user.".bright_yellow().bold());
    }

    let format = if matches.get_flag("json") {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let output = OutputManager::new(OutputConfig {
        format,
        colored: !matches.get_flag("no-color"),
    });
    output.write_results(&result)?;

    if result.interrupted {
        process::exit(EXIT_INTERRUPTED);
    }

    Ok(())
}

/// Config file (explicit or default location) with command line overrides on top
fn build_config(matches: &ArgMatches) -> portsweep::Result<ScanConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ScanConfig::from_toml_file(path)?,
        None => ScanConfig::load_default_config(),
    };

    if let Some(concurrency) = matches.get_one::<usize>("concurrency") {
        config = config.with_concurrency(*concurrency);
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config = config.with_timeout(*timeout);
    }
    if matches.get_flag("no-ping") {
        config = config.with_skip_reachability(true);
    }
    if matches.get_flag("quiet") || matches.get_flag("json") {
        config = config.with_realtime_notifications(false);
    }

    config.validate()?;
    Ok(config)
}

fn parse_range(start: &str, end: &str) -> portsweep::Result<PortRange> {
    PortRange::new(parse_port_input(start)?, parse_port_input(end)?)
}

/// Read one line from stdin, giving up if the user interrupts
async fn prompt_interruptible(
    message: &'static str,
    cancel: &CancellationToken,
) -> portsweep::Result<String> {
    let read = tokio::task::spawn_blocking(move || prompt(message));

    tokio::select! {
        _ = cancel.cancelled() => Err(ScanError::Interrupted),
        joined = read => match joined {
            Ok(line) => line,
            Err(e) => Err(ScanError::IoError(io::Error::new(io::ErrorKind::Other, e))),
        },
    }
}

fn prompt(message: &str) -> portsweep::Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Err(ScanError::InvalidInput("no input provided".to_string()));
    }

    Ok(line.trim().to_string())
}

/// Print a user-facing message for a fatal error and pick the exit status
fn report_error(error: &ScanError) -> i32 {
    log::debug!("Fatal error: {:?}", error);

    match error {
        ScanError::HostResolution { .. } => {
            eprintln!(
                "{}",
                "Error: Unable to resolve hostname. Please check the input.".bright_red()
            );
            2
        }
        ScanError::InvalidInput(_) => {
            eprintln!(
                "{}",
                "Error: Invalid input. Please enter numeric values for ports.".bright_red()
            );
            2
        }
        ScanError::InvalidRange { .. } => {
            eprintln!(
                "{}",
                "Invalid port range. Please enter a valid range (1-65535).".bright_red()
            );
            2
        }
        ScanError::HostUnreachable(ip) => {
            eprintln!("{}", format!("Host {} is unreachable.", ip).bright_red());
            1
        }
        ScanError::Interrupted => {
            eprintln!("\n{}", "Scan interrupted by user.".bright_yellow().bold());
            EXIT_INTERRUPTED
        }
        ScanError::ConfigError(msg) => {
            eprintln!("{} {}", "Configuration error:".bright_red().bold(), msg);
            2
        }
        other => {
            eprintln!(
                "{} {}",
                "An unexpected error occurred:".bright_red().bold(),
                other
            );
            1
        }
    }
}

/// Raise the open file limit so every in-flight probe can hold a socket
#[cfg(unix)]
fn adjust_ulimit_size(wanted: u64) -> u64 {
    use rlimit::Resource;

    let (soft, hard) = match Resource::NOFILE.get() {
        Ok(limits) => limits,
        Err(e) => {
            log::warn!("Could not get file descriptor limit: {}", e);
            return wanted;
        }
    };

    if soft >= wanted {
        return soft;
    }

    let target = wanted.min(hard);
    match Resource::NOFILE.set(target, hard) {
        Ok(()) => {
            log::info!("Raised open file limit from {} to {}", soft, target);
            if target < wanted {
                eprintln!(
                    "{} {}",
                    "[!] WARNING: open file limit capped at".bright_yellow(),
                    target.to_string().bright_cyan()
                );
            }
            target
        }
        Err(e) => {
            eprintln!(
                "{} {} ({})",
                "[!] WARNING: could not raise open file limit above".bright_yellow(),
                soft.to_string().bright_cyan(),
                e
            );
            soft
        }
    }
}

#[cfg(not(unix))]
fn adjust_ulimit_size(wanted: u64) -> u64 {
    wanted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bad_cli_range_rejected_before_lookup() {
        let matches = build_cli().get_matches_from([
            "portsweep",
            "host-that-does-not-exist.invalid",
            "100",
            "50",
            "--no-ping",
        ]);

        let result = run(&matches, CancellationToken::new()).await;
        assert!(matches!(
            result,
            Err(ScanError::InvalidRange {
                start: 100,
                end: 50
            })
        ));
    }

    #[tokio::test]
    async fn test_non_numeric_cli_port_rejected_before_lookup() {
        let matches = build_cli().get_matches_from([
            "portsweep",
            "host-that-does-not-exist.invalid",
            "ssh",
            "80",
        ]);

        let result = run(&matches, CancellationToken::new()).await;
        assert!(matches!(result, Err(ScanError::InvalidInput(_))));
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(report_error(&ScanError::Interrupted), EXIT_INTERRUPTED);
        assert_eq!(
            report_error(&ScanError::InvalidRange { start: 0, end: 10 }),
            2
        );
    }
}
