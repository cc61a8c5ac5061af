// src/task.rs

//! Tasks: addressable units of work owned by a [`Plan`](crate::plan::Plan).
//!
//! A task holds exactly one body -- either a declarative [`Op`] handed to the
//! plan's operation executor, or a functional body run directly by the
//! runner. Dependencies are expressed as [`TaskId`] handles, which are only
//! meaningful on the plan that created them.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::outcome::{Outcome, Results};
use crate::policy::ErrorPolicy;

/// Stable handle to a task within the plan that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// A declarative operation: an opaque `{operation, target, params}` triple
/// realized by the plan's [`OpExecutor`](crate::exec::OpExecutor).
#[derive(Debug, Clone)]
pub struct Op {
    pub operation: String,
    pub target: String,
    pub params: HashMap<String, Value>,
}

impl Op {
    pub fn new(operation: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            target: target.into(),
            params: HashMap::new(),
        }
    }

    /// Add a parameter. Returns `self` for chaining.
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Boxed future returned by a functional task body.
pub type TaskFuture = Pin<Box<dyn Future<Output = anyhow::Result<Outcome>> + Send>>;

/// A functional task body. Invoked once per attempt with the run's
/// cancellation token; the token is the body's only contract with the runner.
pub type TaskFn = Box<dyn Fn(CancellationToken) -> TaskFuture + Send + Sync>;

/// A custom guard predicate. Receives the results recorded so far; returning
/// `false` skips the task. Guards are evaluated synchronously under the
/// runner's lock and must not block.
pub type GuardFn = Box<dyn Fn(&Results) -> bool + Send + Sync>;

/// The two task body kinds. The runner discriminates once per attempt.
pub(crate) enum TaskBody {
    Op(Op),
    Func(TaskFn),
}

/// A unit of work in an orchestration plan.
pub struct Task {
    pub(crate) name: String,
    pub(crate) body: TaskBody,
    pub(crate) deps: Vec<TaskId>,
    pub(crate) guard: Option<GuardFn>,
    pub(crate) requires_change: bool,
    pub(crate) on_error: Option<ErrorPolicy>,
}

impl Task {
    pub(crate) fn new(name: String, body: TaskBody) -> Self {
        Self {
            name,
            body,
            deps: Vec::new(),
            guard: None,
            requires_change: false,
            on_error: None,
        }
    }

    /// The task name, unique within its plan.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this task has a functional body.
    pub fn is_func(&self) -> bool {
        matches!(self.body, TaskBody::Func(_))
    }

    /// Handles of this task's direct dependencies, in declaration order.
    pub fn dependencies(&self) -> &[TaskId] {
        &self.deps
    }

    /// Whether [`Task::only_if_changed`] was set.
    pub fn requires_change(&self) -> bool {
        self.requires_change
    }

    /// The per-task error policy override, if any.
    pub fn error_policy(&self) -> Option<ErrorPolicy> {
        self.on_error
    }

    /// Append dependencies. Returns `&mut self` for chaining.
    pub fn depends_on<I>(&mut self, deps: I) -> &mut Self
    where
        I: IntoIterator<Item = TaskId>,
    {
        self.deps.extend(deps);
        self
    }

    /// Skip this task unless at least one direct dependency reported
    /// `changed = true`.
    pub fn only_if_changed(&mut self) -> &mut Self {
        self.requires_change = true;
        self
    }

    /// Install a custom guard predicate deciding whether this task runs.
    pub fn when<F>(&mut self, guard: F) -> &mut Self
    where
        F: Fn(&Results) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Override the plan's default error policy for this task.
    pub fn on_error(&mut self, policy: ErrorPolicy) -> &mut Self {
        self.on_error = Some(policy);
        self
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("kind", if self.is_func() { &"fn" } else { &"op" })
            .field("deps", &self.deps)
            .field("requires_change", &self.requires_change)
            .field("has_guard", &self.guard.is_some())
            .field("on_error", &self.on_error)
            .finish()
    }
}
