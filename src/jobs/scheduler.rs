use std::{sync::Arc, time::Duration};
use tokio::{
    signal,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::jobs::{Clock, Job, JobOutcome, JobState, ScheduleError, SystemClock};

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
        }
    }
}

/// Sequential daily-job runner.
///
/// Jobs never overlap: each due job is run to completion before the next one
/// is checked. A failing or panicking job is logged and the loop moves on.
pub struct Scheduler {
    jobs: Vec<Job>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    shutdown_token: CancellationToken,
}

impl Scheduler {
    pub fn new(jobs: Vec<Job>, config: SchedulerConfig) -> Result<Self, ScheduleError> {
        Self::with_clock(jobs, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        jobs: Vec<Job>,
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ScheduleError> {
        if jobs.is_empty() {
            return Err(ScheduleError::NoJobs);
        }
        Ok(Self {
            jobs,
            clock,
            config,
            shutdown_token: CancellationToken::new(),
        })
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Token that stops the loop at the next tick boundary.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Cancel the loop on Ctrl-C.
    pub fn listen_for_ctrl_c(&self) {
        let shutdown_token = self.shutdown_token.clone();
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal, stopping after the current job...");
            shutdown_token.cancel();
        });
    }

    /// Computes every job's first fire time, then runs each job once.
    ///
    /// The cold-start run does not consume the computed slot: a job started
    /// at 10:00 with slots at 09:00 and 18:00 still fires again at 18:00.
    pub async fn start(&mut self) {
        let now = self.clock.now();
        for job in &mut self.jobs {
            job.advance(now);
            match job.next_fire() {
                Some(at) => info!(job = %job.name(), next_fire = %at, "job scheduled"),
                None => warn!(job = %job.name(), "job has no fire times"),
            }
        }

        info!(jobs = self.jobs.len(), "cold start: running every job once");
        for index in 0..self.jobs.len() {
            self.fire(index).await;
        }
    }

    /// Runs every job whose fire time has passed, in configuration order.
    /// Returns how many jobs fired.
    pub async fn run_pending(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        for index in 0..self.jobs.len() {
            if !self.jobs[index].check_due(now) {
                continue;
            }
            self.fire(index).await;
            let job = &mut self.jobs[index];
            job.advance(now);
            if let Some(at) = job.next_fire() {
                info!(job = %job.name(), next_fire = %at, "job rescheduled");
            }
            fired += 1;
        }
        fired
    }

    /// Cold start followed by the polling loop; returns once the shutdown
    /// token is cancelled.
    pub async fn run(mut self) {
        info!(
            "Starting scheduler - jobs: {}, poll_interval: {}s",
            self.jobs.len(),
            self.config.poll_interval.as_secs()
        );

        self.start().await;

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_token.cancelled() => {
                    info!("Scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_pending().await;
                }
            }
        }
    }

    /// Runs one job to completion on its own task so a panic surfaces as a
    /// join error instead of unwinding through the loop.
    async fn fire(&mut self, index: usize) -> bool {
        let started_at = self.clock.now();
        let job = &mut self.jobs[index];
        job.set_state(JobState::Running);

        let name = job.name().to_string();
        let handler = job.handler();
        let span = info_span!("job", name = %name, run_id = %Uuid::new_v4());

        let result = tokio::spawn(async move { handler.run().await }.instrument(span.clone()))
            .await;

        let succeeded = span.in_scope(|| match result {
            Ok(Ok(JobOutcome::Written { records, paths })) => {
                info!(records, latest = %paths.latest.display(), "Job completed successfully");
                true
            }
            Ok(Ok(JobOutcome::Empty)) => {
                warn!("Job completed without records, previous snapshot kept");
                true
            }
            Ok(Err(e)) => {
                error!(job = %name, at = %started_at, error = ?e, "Job failed");
                false
            }
            Err(join_error) => {
                error!(job = %name, at = %started_at, error = %join_error, "Job panicked");
                false
            }
        });

        let job = &mut self.jobs[index];
        job.record_run(succeeded);
        job.set_state(JobState::Idle);
        succeeded
    }
}
