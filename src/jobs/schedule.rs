use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::warn;

use crate::{config::ScheduleEntry, jobs::JobHandler, jobs::JobRegistry, sources::SourceCatalog};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("no handler registered for source '{0}'")]
    NoHandler(String),

    #[error("no schedule entry resolves to a known source")]
    NoJobs,
}

/// Source of "now" in local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// First occurrence of any of `times` strictly after `now`: today if a time
/// is still ahead, otherwise the earliest time tomorrow.
pub fn next_fire_after(now: NaiveDateTime, times: &[NaiveTime]) -> Option<NaiveDateTime> {
    let today = now.date();
    let tomorrow = today.checked_add_days(Days::new(1))?;
    times
        .iter()
        .map(|time| {
            let candidate = today.and_time(*time);
            if candidate > now {
                candidate
            } else {
                tomorrow.and_time(*time)
            }
        })
        .min()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Due,
    Running,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobState::Idle => "idle",
            JobState::Due => "due",
            JobState::Running => "running",
        };
        f.write_str(label)
    }
}

/// A handler plus the daily times it fires at.
pub struct Job {
    name: String,
    times: Vec<NaiveTime>,
    handler: Arc<dyn JobHandler>,
    next_fire: Option<NaiveDateTime>,
    state: JobState,
    runs: u32,
    failures: u32,
}

impl Job {
    pub fn new(name: impl Into<String>, times: Vec<NaiveTime>, handler: Arc<dyn JobHandler>) -> Self {
        let mut times = times;
        times.sort_unstable();
        times.dedup();
        Self {
            name: name.into(),
            times,
            handler,
            next_fire: None,
            state: JobState::Idle,
            runs: 0,
            failures: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn times(&self) -> &[NaiveTime] {
        &self.times
    }
    pub fn next_fire(&self) -> Option<NaiveDateTime> {
        self.next_fire
    }
    pub fn state(&self) -> JobState {
        self.state
    }
    pub fn runs(&self) -> u32 {
        self.runs
    }
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub(crate) fn handler(&self) -> Arc<dyn JobHandler> {
        self.handler.clone()
    }

    /// Moves the next fire time to the first slot strictly after `now`.
    pub(crate) fn advance(&mut self, now: NaiveDateTime) {
        self.next_fire = next_fire_after(now, &self.times);
    }

    /// Marks the job due if its fire time has been reached.
    pub(crate) fn check_due(&mut self, now: NaiveDateTime) -> bool {
        let due = self.next_fire.is_some_and(|at| at <= now);
        if due {
            self.state = JobState::Due;
        }
        due
    }

    pub(crate) fn set_state(&mut self, state: JobState) {
        self.state = state;
    }

    pub(crate) fn record_run(&mut self, succeeded: bool) {
        self.runs += 1;
        if !succeeded {
            self.failures += 1;
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("times", &self.times)
            .field("next_fire", &self.next_fire)
            .field("state", &self.state)
            .finish()
    }
}

/// Turns config entries into one job per source. Entries resolving to the
/// same source (`marketwatch_morning`, `marketwatch_evening`) are merged so
/// the source runs once per slot, not once per entry. Entries naming an
/// unknown source are skipped with a warning.
pub fn plan_jobs(
    entries: &[ScheduleEntry],
    catalog: &SourceCatalog,
    registry: &JobRegistry,
) -> Result<Vec<Job>, ScheduleError> {
    let mut jobs: Vec<Job> = Vec::new();
    for entry in entries {
        let Some(source) = catalog.resolve_job(&entry.name) else {
            warn!(job = %entry.name, "schedule entry matches no source, skipping");
            continue;
        };
        if let Some(job) = jobs.iter_mut().find(|job| job.name == source.name) {
            let mut times = std::mem::take(&mut job.times);
            times.extend(entry.times.iter().copied());
            times.sort_unstable();
            times.dedup();
            job.times = times;
            continue;
        }
        let handler = registry
            .get(&source.name)
            .map_err(|_| ScheduleError::NoHandler(source.name.clone()))?;
        jobs.push(Job::new(source.name.clone(), entry.times.clone(), handler));
    }
    Ok(jobs)
}
