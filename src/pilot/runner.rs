//! Pilot runner: one health-check run per scheduler tick
//!
//! A run reads the last-known-good snapshot, probes the connection, lets the
//! evaluator decide, persists the snapshot on success and delivers any
//! notifications to the configured sinks. Runs never overlap: the loop awaits
//! each run before waiting for the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::evaluator::{evaluate, Decision, EvaluationPolicy, RunContext};
use crate::host::HostEnvironment;
use crate::notify::NotificationSink;
use crate::probe::ConnectionProber;
use crate::storage::{HealthStateStore, StorageError};
use crate::types::{HealthSnapshot, Notification};

/// Default scheduling interval (hourly)
pub const DEFAULT_RUN_INTERVAL: Duration = Duration::from_secs(3600);

/// Infrastructure failures that leave a run unresolved.
///
/// Connection problems are never errors here; they become notifications.
#[derive(Debug, thiserror::Error)]
pub enum PilotError {
    #[error("health state store unavailable: {0}")]
    Storage(#[from] StorageError),
}

/// Outcome of a single run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub decision: Decision,
    /// Snapshot persisted by this run, if the probe succeeded
    pub snapshot_written: Option<HealthSnapshot>,
    /// Notifications in emission order
    pub notifications: Vec<Notification>,
    /// Sink deliveries that failed (notification × sink)
    pub delivery_failures: usize,
    pub started_at: DateTime<Utc>,
}

/// Aggregated pilot state, shared with the host
#[derive(Debug, Clone, Default)]
pub struct PilotStatus {
    /// Runs that reached a decision
    pub runs_completed: u64,
    /// Runs aborted by an infrastructure failure
    pub runs_failed: u64,
    pub last_decision: Option<Decision>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Connection pilot: owns the collaborators for scheduled runs
pub struct ConnectionPilot {
    store: HealthStateStore,
    prober: Arc<dyn ConnectionProber>,
    host: Arc<dyn HostEnvironment>,
    sinks: Vec<Arc<dyn NotificationSink>>,
    policy: EvaluationPolicy,
    interval: Duration,
    status: Arc<RwLock<PilotStatus>>,
}

impl ConnectionPilot {
    /// Create a pilot with the default policy, hourly interval and no sinks
    pub fn new(
        store: HealthStateStore,
        prober: Arc<dyn ConnectionProber>,
        host: Arc<dyn HostEnvironment>,
    ) -> Self {
        Self {
            store,
            prober,
            host,
            sinks: Vec::new(),
            policy: EvaluationPolicy::default(),
            interval: DEFAULT_RUN_INTERVAL,
            status: Arc::new(RwLock::new(PilotStatus::default())),
        }
    }

    pub fn with_policy(mut self, policy: EvaluationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Get a shared reference to pilot status (for host status pages)
    pub fn status_handle(&self) -> Arc<RwLock<PilotStatus>> {
        self.status.clone()
    }

    /// Run the scheduler loop until `cancel` fires.
    ///
    /// The first run starts immediately. A failed run is logged and retried
    /// on the next tick.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            sinks = self.sinks.len(),
            "Connection pilot started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("Connection pilot stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.run_once().await {
                error!(error = %e, "Connection pilot run failed");
            }
        }
    }

    /// Execute one run: probe, evaluate, persist, deliver.
    pub async fn run_once(&self) -> Result<RunReport, PilotError> {
        let started_at = Utc::now();

        let prior = match self.store.get() {
            Ok(prior) => prior,
            Err(e) => {
                self.record_failure(started_at, &e).await;
                return Err(e.into());
            }
        };

        let site_url = self.host.site_url();
        let tenant = self.host.tenant_metadata();
        let check = self.prober.check_connection().await;

        debug!(
            site = %site_url,
            connected = check.is_ok(),
            has_prior = prior.is_some(),
            "Connection probed"
        );

        let ctx = RunContext {
            site_url: &site_url,
            prior: prior.as_ref(),
            tenant: &tenant,
            now: started_at,
            policy: &self.policy,
        };
        let evaluation = evaluate(&ctx, check, self.prober.as_ref()).await;

        if let Some(snapshot) = &evaluation.store_write {
            if let Err(e) = self.store.put(snapshot) {
                self.record_failure(started_at, &e).await;
                return Err(e.into());
            }
        }

        let delivery_failures = self.deliver(&evaluation.notifications).await;

        info!(
            site = %site_url,
            decision = %evaluation.decision,
            notifications = evaluation.notifications.len(),
            delivery_failures,
            "Connection pilot run complete"
        );

        {
            let mut status = self.status.write().await;
            status.runs_completed += 1;
            status.last_decision = Some(evaluation.decision);
            status.last_run_at = Some(started_at);
            status.last_error = None;
        }

        Ok(RunReport {
            decision: evaluation.decision,
            snapshot_written: evaluation.store_write,
            notifications: evaluation.notifications,
            delivery_failures,
            started_at,
        })
    }

    /// Hand every notification to every sink; returns the failure count
    async fn deliver(&self, notifications: &[Notification]) -> usize {
        let mut failures = 0;

        for notification in notifications {
            for sink in &self.sinks {
                if let Err(e) = sink.deliver(notification).await {
                    warn!(
                        sink = sink.name(),
                        kind = ?notification.kind,
                        error = %e,
                        "Notification delivery failed"
                    );
                    failures += 1;
                }
            }
        }

        failures
    }

    async fn record_failure(&self, at: DateTime<Utc>, err: &StorageError) {
        let mut status = self.status.write().await;
        status.runs_failed += 1;
        status.last_run_at = Some(at);
        status.last_error = Some(err.to_string());
    }
}
