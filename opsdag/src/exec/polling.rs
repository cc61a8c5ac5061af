// src/exec/polling.rs

//! Job-submission executor: submit an op as a remote job, then poll until
//! the job reaches a terminal state.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::OpExecutor;
use crate::outcome::Outcome;
use crate::task::Op;

/// Default interval between job status polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Remote job lifecycle as reported by a [`JobClient`].
#[derive(Debug, Clone)]
pub enum JobState {
    Queued,
    Running,
    Completed { result: HashMap<String, Value> },
    Failed { message: String },
}

/// Minimal surface of a remote job API: submit an operation, read a job's
/// state. Transport, auth, and serialization all live behind this trait,
/// outside this crate.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Submit `op` and return the new job's id.
    async fn submit(&self, op: &Op) -> Result<String>;

    /// Current state of the job.
    async fn status(&self, job_id: &str) -> Result<JobState>;
}

/// [`OpExecutor`] that drives ops through a [`JobClient`], polling at a
/// fixed cadence until the job lands in a terminal state.
///
/// A completed job maps to `Outcome { changed: true, data: <job result> }`;
/// a failed job becomes an error carrying the server's message. A cancelled
/// token stops the poll loop immediately, so a halted run does not leak
/// pollers.
pub struct PollingExecutor<C> {
    client: C,
    interval: Duration,
}

impl<C> PollingExecutor<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll cadence.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl<C: JobClient> OpExecutor for PollingExecutor<C> {
    async fn execute(&self, cancel: &CancellationToken, op: &Op) -> Result<Outcome> {
        let job_id = self
            .client
            .submit(op)
            .await
            .with_context(|| format!("submit job for operation {:?}", op.operation))?;

        debug!(
            operation = %op.operation,
            target = %op.target,
            job_id = %job_id,
            "job submitted"
        );

        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!(job_id = %job_id, "job poll cancelled");
                    bail!("job {job_id} cancelled");
                }
                _ = ticker.tick() => {
                    let state = self
                        .client
                        .status(&job_id)
                        .await
                        .with_context(|| format!("poll job {job_id}"))?;

                    match state {
                        JobState::Completed { result } => {
                            debug!(job_id = %job_id, "job completed");

                            return Ok(Outcome {
                                changed: true,
                                data: result,
                            });
                        }
                        JobState::Failed { message } => bail!("job {job_id}: {message}"),
                        JobState::Queued | JobState::Running => {}
                    }
                }
            }
        }
    }
}
