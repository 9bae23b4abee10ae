// src/job/scheduler.rs
use super::{HealthCheckJob, InvocationOutcome, ScheduleStatus};
use crate::config::ScheduleConfig;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval_at, timeout, Duration, Instant, MissedTickBehavior};
use tracing::{error, info, Instrument};

/// Fixed-interval host for [`HealthCheckJob`]. Runs invocations one at a
/// time, each inside its own task and time budget.
pub struct Scheduler {
    job: Arc<HealthCheckJob>,
    period: Duration,
    budget: Duration,
    run_on_startup: bool,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl Scheduler {
    pub fn new(job: Arc<HealthCheckJob>, config: &ScheduleConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        Self {
            job,
            period: config.interval(),
            budget: config.invocation_budget(),
            run_on_startup: config.run_on_startup,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub async fn run(&self) {
        let start = if self.run_on_startup {
            Instant::now()
        } else {
            Instant::now() + self.period
        };
        let mut ticker = interval_at(start, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut last = None;

        info!("Starting health check schedule with interval: {:?}", self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Utc::now();
                    let status = ScheduleStatus {
                        last,
                        next: now + chrono::Duration::from_std(self.period).unwrap_or_else(|_| chrono::Duration::zero()),
                    };
                    last = Some(now);
                    self.invoke(Some(status)).await;
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Health check schedule shutting down");
                        break;
                    }
                }
            }
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Panics and budget overruns stop at this boundary. `status` is `None`
    /// when something outside this process owns the timing.
    pub async fn invoke(&self, status: Option<ScheduleStatus>) -> Option<InvocationOutcome> {
        let invocation_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("invocation", id = %invocation_id);

        let job = self.job.clone();
        let mut task = tokio::spawn(
            async move { job.run_check(status.as_ref()).await }.instrument(span.clone()),
        );

        match timeout(self.budget, &mut task).await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(e)) => {
                span.in_scope(|| error!("Unhandled error during invocation: {}", e));
                None
            }
            Err(_) => {
                task.abort();
                span.in_scope(|| {
                    error!("Invocation exceeded its {:?} budget and was abandoned", self.budget)
                });
                None
            }
        }
    }
}
