// src/errors.rs

//! Typed errors for plan validation and execution.
//!
//! Task-body failures are plain [`anyhow::Error`]s; the structured types
//! here cover the plan-level taxonomy: structural problems found before any
//! execution, and a run aborted by a fatal task failure.

use std::sync::Arc;

use thiserror::Error;

use crate::outcome::Report;
use crate::task::TaskId;

pub use anyhow::Result;

/// Structural problems detected by plan validation. No execution occurs.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("duplicate task name: {0:?}")]
    DuplicateName(String),

    /// Names one edge on the detected cycle.
    #[error("cycle detected: {from:?} depends on {to:?}")]
    Cycle { from: String, to: String },

    /// A dependency handle that does not resolve within this plan. Handles
    /// are only meaningful on the plan that created them.
    #[error("task {task:?} has a dependency handle that does not resolve in this plan")]
    UnknownDependency { task: String, id: TaskId },
}

/// Errors returned by [`Plan::run`](crate::plan::Plan::run).
#[derive(Debug, Error)]
pub enum RunError {
    /// The plan failed validation; nothing ran and there is no report.
    #[error("plan validation: {0}")]
    Validation(#[from] PlanError),

    /// A task failed under a fatal policy (`stop_all`, or `retry` after
    /// exhaustion). Carries the partial report accumulated up to and
    /// including the aborted wave.
    #[error("task {task:?} failed: {error}")]
    Aborted {
        task: String,
        error: Arc<anyhow::Error>,
        report: Report,
    },
}

impl RunError {
    /// The partial report for aborted runs, `None` for validation errors.
    pub fn report(&self) -> Option<&Report> {
        match self {
            RunError::Aborted { report, .. } => Some(report),
            RunError::Validation(_) => None,
        }
    }
}
