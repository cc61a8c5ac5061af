// src/exec/mod.rs

//! Pluggable operation executors.
//!
//! The runner realizes declarative op tasks through the [`OpExecutor`]
//! trait and nothing else. This keeps remote-job plumbing out of the engine:
//! production code installs [`PollingExecutor`] wired to a real job API,
//! while tests swap in fakes that complete instantly.

mod polling;

pub use polling::{JobClient, JobState, PollingExecutor};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::outcome::Outcome;
use crate::task::Op;

/// Executes a declarative operation to a terminal outcome.
///
/// `execute` blocks -- honoring `cancel` -- until the operation succeeds
/// with an [`Outcome`] or fails with an error. Implementations may suspend
/// internally (e.g. poll a remote job); the runner neither knows nor cares.
/// Calls for distinct tasks may arrive concurrently within a wave.
#[async_trait]
pub trait OpExecutor: Send + Sync {
    async fn execute(&self, cancel: &CancellationToken, op: &Op) -> anyhow::Result<Outcome>;
}
