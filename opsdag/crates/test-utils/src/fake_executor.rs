use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use opsdag::exec::{JobClient, JobState, OpExecutor};
use opsdag::{Op, Outcome};
use tokio_util::sync::CancellationToken;

/// An [`OpExecutor`] that:
/// - records the operations it was asked to execute, in order
/// - succeeds with `changed = true`, except for operations registered via
///   [`StaticExecutor::failing`].
#[derive(Default)]
pub struct StaticExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    failures: HashSet<String>,
}

impl StaticExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `operation` fail with a canned error.
    pub fn failing(mut self, operation: &str) -> Self {
        self.failures.insert(operation.to_string());
        self
    }

    /// Handle to the execution log; clone before moving the executor into a
    /// plan.
    pub fn executed(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.executed)
    }
}

#[async_trait]
impl OpExecutor for StaticExecutor {
    async fn execute(&self, _cancel: &CancellationToken, op: &Op) -> Result<Outcome> {
        self.executed.lock().unwrap().push(op.operation.clone());

        if self.failures.contains(&op.operation) {
            bail!("operation {} failed", op.operation);
        }

        Ok(Outcome::new(true))
    }
}

/// A [`JobClient`] that serves a scripted sequence of [`JobState`]s.
///
/// Each `status` call pops the next state; the final state is sticky so
/// pollers always reach it.
pub struct FakeJobClient {
    states: Mutex<VecDeque<JobState>>,
    submitted: Arc<Mutex<Vec<String>>>,
    fail_submit: bool,
}

impl FakeJobClient {
    pub fn with_states(states: Vec<JobState>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            submitted: Arc::new(Mutex::new(Vec::new())),
            fail_submit: false,
        }
    }

    /// A client whose `submit` is rejected outright.
    pub fn failing_submit() -> Self {
        let mut client = Self::with_states(Vec::new());
        client.fail_submit = true;
        client
    }

    pub fn submitted(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.submitted)
    }
}

#[async_trait]
impl JobClient for FakeJobClient {
    async fn submit(&self, op: &Op) -> Result<String> {
        if self.fail_submit {
            bail!("submit rejected");
        }

        self.submitted.lock().unwrap().push(op.operation.clone());

        Ok("job-1".to_string())
    }

    async fn status(&self, _job_id: &str) -> Result<JobState> {
        let mut states = self.states.lock().unwrap();

        if states.len() > 1 {
            Ok(states.pop_front().expect("states non-empty"))
        } else {
            Ok(states.front().cloned().unwrap_or(JobState::Running))
        }
    }
}
