// src/outcome.rs

//! Outcome model: per-task results, the shared results map, and the
//! aggregate report returned by a plan run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

/// Execution status of a task.
///
/// `Pending` and `Running` are internal; every task recorded in a final
/// [`Report`] carries one of the four terminal statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Pending,
    Running,
    /// Ran and reported `changed = true`.
    Changed,
    /// Ran and reported `changed = false`.
    Unchanged,
    /// A guard fired before the body ran.
    Skipped,
    /// The body returned an error after retries were exhausted.
    Failed,
}

impl Status {
    /// The public string rendering; part of the API contract.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Running => "running",
            Status::Changed => "changed",
            Status::Unchanged => "unchanged",
            Status::Skipped => "skipped",
            Status::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a single task body execution.
///
/// `changed` is the signal change-gated dependents key off; `data` is an
/// opaque payload for guards and downstream consumers.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub changed: bool,
    pub data: HashMap<String, Value>,
}

impl Outcome {
    /// An outcome with the given change flag and no payload.
    pub fn new(changed: bool) -> Self {
        Self {
            changed,
            data: HashMap::new(),
        }
    }

    /// Attach a payload entry. Returns `self` for chaining.
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// Map of task name to [`Outcome`] for tasks that ran successfully.
///
/// Custom guards receive a reference to this map; it never contains entries
/// for skipped or failed tasks.
#[derive(Debug, Clone, Default)]
pub struct Results(HashMap<String, Outcome>);

impl Results {
    /// The outcome recorded for `name`, if the task completed.
    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.0.get(name)
    }

    /// Whether `name` completed with `changed = true`.
    pub fn changed(&self, name: &str) -> bool {
        self.get(name).is_some_and(|o| o.changed)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn insert(&mut self, name: String, outcome: Outcome) {
        self.0.insert(name, outcome);
    }
}

/// Full execution record for one task the runner considered.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub name: String,
    pub status: Status,
    pub changed: bool,
    pub duration: Duration,
    /// The final attempt's error for failed tasks. Shared so the same error
    /// can also travel in [`RunError::Aborted`](crate::errors::RunError).
    pub error: Option<Arc<anyhow::Error>>,
}

/// Aggregate output of a plan run.
///
/// Task order follows wave order; within a wave, the order tasks were added
/// to the plan.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub tasks: Vec<TaskResult>,
    pub duration: Duration,
}

impl Report {
    /// Human-readable one-line summary, e.g. `3 tasks, 2 changed, 1 skipped`.
    /// Zero counts are omitted.
    pub fn summary(&self) -> String {
        let mut changed = 0;
        let mut unchanged = 0;
        let mut skipped = 0;
        let mut failed = 0;

        for t in &self.tasks {
            match t.status {
                Status::Changed => changed += 1,
                Status::Unchanged => unchanged += 1,
                Status::Skipped => skipped += 1,
                Status::Failed => failed += 1,
                Status::Pending | Status::Running => {}
            }
        }

        let mut parts = vec![format!("{} tasks", self.tasks.len())];

        if changed > 0 {
            parts.push(format!("{changed} changed"));
        }
        if unchanged > 0 {
            parts.push(format!("{unchanged} unchanged"));
        }
        if skipped > 0 {
            parts.push(format!("{skipped} skipped"));
        }
        if failed > 0 {
            parts.push(format!("{failed} failed"));
        }

        parts.join(", ")
    }
}
