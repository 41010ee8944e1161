//! Main scanning engine implementation

use crate::config::ScanConfig;
use crate::network::{
    check_reachable, ConnectionProbe, ProbeOutcome, ServiceDatabase, TcpConnectProbe,
};
use crate::output;
use crate::scanner::{ConcurrencyLimiter, ResultCollector, ScanResult};
use crate::target::Target;
use crate::ScanError;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Scan orchestrator.
///
/// Each engine owns its own limiter and service table, so two engines never
/// share capacity and nothing carries over between test cases.
///
/// Every port moves through `Pending -> InFlight -> Open | Closed | Errored`.
/// A port is in flight exactly while its task holds a permit, and the scan is
/// done once every scheduled port is terminal (or was aborted by cancellation).
pub struct ScanEngine {
    config: ScanConfig,
    limiter: ConcurrencyLimiter,
    probe: Arc<dyn ConnectionProbe>,
    service_db: Arc<ServiceDatabase>,
}

impl ScanEngine {
    /// Create a new scan engine with the given configuration
    pub fn new(config: ScanConfig) -> crate::Result<Self> {
        config.validate()?;

        let service_db = if config.system_services {
            ServiceDatabase::load()
        } else {
            ServiceDatabase::new()
        };

        log::debug!(
            "Engine ready: concurrency={}, timeout={}ms, {} service names",
            config.concurrency,
            config.timeout,
            service_db.len()
        );

        Ok(Self {
            limiter: ConcurrencyLimiter::new(config.concurrency),
            probe: Arc::new(TcpConnectProbe::new(config.timeout_duration())),
            service_db: Arc::new(service_db),
            config,
        })
    }

    /// Replace the service name table
    pub fn with_service_database(mut self, service_db: ServiceDatabase) -> Self {
        self.service_db = Arc::new(service_db);
        self
    }

    /// Replace the connect probe used for every port
    pub fn with_probe(mut self, probe: impl ConnectionProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Pre-flight liveness check using the configured port and timeout
    pub async fn host_reachable(&self, ip: IpAddr) -> bool {
        check_reachable(
            ip,
            self.config.reachability_port,
            self.config.reachability_timeout_duration(),
        )
        .await
    }

    /// Run the reachability gate (unless disabled), then scan.
    ///
    /// An interrupt during the gate returns [`ScanError::Interrupted`].
    pub async fn scan_if_reachable(
        &self,
        target: &Target,
        cancel: CancellationToken,
    ) -> crate::Result<ScanResult> {
        if !self.config.skip_reachability {
            let reachable = tokio::select! {
                _ = cancel.cancelled() => return Err(ScanError::Interrupted),
                up = self.host_reachable(target.ip) => up,
            };
            if !reachable {
                return Err(ScanError::HostUnreachable(target.ip));
            }
        }

        self.scan_until(target, cancel).await
    }

    /// Scan every port of the target to completion
    pub async fn scan(&self, target: &Target) -> crate::Result<ScanResult> {
        self.scan_until(target, CancellationToken::new()).await
    }

    /// Scan every port of the target, stopping early when `cancel` fires.
    ///
    /// On cancellation, in-flight probes are aborted and the outcomes gathered
    /// so far are returned with `interrupted` set.
    pub async fn scan_until(
        &self,
        target: &Target,
        cancel: CancellationToken,
    ) -> crate::Result<ScanResult> {
        log::info!(
            "Scanning {} ({}) ports {} with concurrency {}",
            target.host,
            target.ip,
            target.ports,
            self.limiter.capacity()
        );

        self.limiter.reset_peak();
        let start_time = Instant::now();
        let mut collector = ResultCollector::new(target.clone());
        let mut tasks: JoinSet<ProbeOutcome> = JoinSet::new();
        let mut ports = target.ports.iter();
        let mut next_port = ports.next();
        let mut interrupted = false;

        loop {
            if next_port.is_none() && tasks.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled(), if !interrupted => {
                    log::warn!(
                        "Scan of {} interrupted with {} probes in flight",
                        target.ip,
                        tasks.len()
                    );
                    interrupted = true;
                    next_port = None;
                    tasks.abort_all();
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.absorb(&mut collector, target.ip, joined);
                }

                permit = self.limiter.acquire(), if next_port.is_some() => {
                    let permit = permit?;
                    let Some(port) = next_port else { continue };

                    let probe = self.probe.clone();
                    let service_db = self.service_db.clone();
                    let ip = target.ip;

                    tasks.spawn(async move {
                        let _permit = permit;
                        match probe.probe(ip, port).await {
                            ProbeOutcome::Open { .. } => ProbeOutcome::Open {
                                port,
                                service: Some(service_db.name_or_unknown(port)),
                            },
                            other => other,
                        }
                    });

                    next_port = ports.next();
                }

                else => break,
            }
        }

        let duration = start_time.elapsed();
        let result = collector.finish(duration, interrupted, self.limiter.peak_in_flight());

        log::info!(
            "Scan of {} finished in {:.2?}: {} open, {} closed, {} errored, {} abandoned",
            target.ip,
            duration,
            result.stats.open,
            result.stats.closed,
            result.stats.errored,
            result.stats.abandoned
        );

        Ok(result)
    }

    /// Fold one finished task into the aggregate
    fn absorb(
        &self,
        collector: &mut ResultCollector,
        ip: IpAddr,
        joined: Result<ProbeOutcome, JoinError>,
    ) {
        match joined {
            Ok(outcome) => {
                match &outcome {
                    ProbeOutcome::Open { port, service }
                        if self.config.realtime_notifications =>
                    {
                        output::notify_open(ip, *port, service.as_deref());
                    }
                    ProbeOutcome::Errored { port, cause } => {
                        log::warn!("Error scanning port {}: {}", port, cause);
                    }
                    _ => {}
                }
                collector.record(outcome);
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                log::error!("Probe task failed: {}", e);
            }
        }
    }
}
