use crate::pipeline::{log_run_outcome, DigestPipeline};
use crate::types::{DigestError, Result, RunOutcome};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Fires the digest pipeline on a cron cadence and guarantees that runs
/// never overlap.
///
/// A trigger that arrives while a run is in progress is dropped, not
/// queued; the next opportunity is the following scheduled firing. The
/// scheduler owns the cadence and nothing else, all work is delegated to
/// the pipeline.
pub struct DigestScheduler {
    schedule: Schedule,
    pipeline: Arc<DigestPipeline>,
    state: Arc<Mutex<SchedulerState>>,
}

impl DigestScheduler {
    /// Parse the cadence expression (Quartz-style: seconds, minutes, hours,
    /// day-of-month, month, day-of-week, optional year) at construction.
    pub fn new(cadence: &str, pipeline: Arc<DigestPipeline>) -> Result<Self> {
        let schedule = Schedule::from_str(cadence)
            .map_err(|e| DigestError::Cadence(format!("{}: {}", cadence, e)))?;

        Ok(Self {
            schedule,
            pipeline,
            state: Arc::new(Mutex::new(SchedulerState::Idle)),
        })
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The next instant the cadence will fire, if any.
    pub fn next_firing(&self) -> Option<DateTime<Utc>> {
        self.schedule.upcoming(Utc).next()
    }

    /// Fire one trigger. Returns `None` when the trigger was dropped because
    /// a run is already in progress; otherwise runs the pipeline to
    /// completion and returns its result.
    ///
    /// A run-level failure (data source unreachable) is reported to the
    /// caller and the scheduler returns to `Idle`; there is no immediate
    /// retry, the next cadence firing is the natural one.
    pub async fn trigger(&self, cancel: &CancellationToken) -> Option<Result<RunOutcome>> {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state == SchedulerState::Running {
                warn!("Trigger fired while a run is in progress, dropping it");
                return None;
            }
            *state = SchedulerState::Running;
        }

        let result = self.pipeline.run(cancel).await;

        match &result {
            Ok(outcome) => log_run_outcome(outcome),
            Err(e) => error!("Digest run failed to start: {}", e),
        }

        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = SchedulerState::Idle;
        Some(result)
    }

    /// Drive the cadence until the cancellation token fires. Each firing is
    /// a trigger; overruns are handled by the drop rule above.
    pub async fn run_forever(&self, cancel: CancellationToken) {
        info!("Scheduler started, next firing at {:?}", self.next_firing());

        loop {
            let next = match self.next_firing() {
                Some(next) => next,
                None => {
                    warn!("Cadence has no future firings, scheduler stopping");
                    return;
                }
            };

            let wait = (next - Utc::now())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = cancel.cancelled() => {
                    info!("Scheduler cancelled, stopping");
                    return;
                }
            }

            if self.trigger(&cancel).await.is_none() {
                info!("Skipped firing at {}, previous run still active", next);
            }
        }
    }
}
