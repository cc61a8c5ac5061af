// src/plan/mod.rs

//! Plans: append-only task containers with validation, wave decomposition,
//! and execution.

mod validate;

use std::fmt::Write as _;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::dag::levelize;
use crate::engine::{Observer, Runner};
use crate::errors::{PlanError, RunError};
use crate::exec::OpExecutor;
use crate::outcome::{Outcome, Report};
use crate::policy::ErrorPolicy;
use crate::task::{Op, Task, TaskBody, TaskFn, TaskFuture, TaskId};

/// Plan-wide configuration, set through the `with_*` options.
pub(crate) struct PlanConfig {
    pub(crate) default_policy: ErrorPolicy,
    pub(crate) observer: Observer,
    pub(crate) executor: Option<Arc<dyn OpExecutor>>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            default_policy: ErrorPolicy::StopAll,
            observer: Observer::default(),
            executor: None,
        }
    }
}

/// A DAG of named tasks with dependency edges.
///
/// Tasks are appended through [`Plan::add_op_task`] / [`Plan::add_fn_task`]
/// and addressed by the returned [`TaskId`] handles; the plan is the sole
/// owner of its tasks. Insertion order is preserved and is the tie-breaker
/// wherever ordering is otherwise unspecified, so a given plan always
/// produces the same wave decomposition.
///
/// Plans are single-use: [`Plan::run`] consumes the plan.
#[derive(Default)]
pub struct Plan {
    tasks: Vec<Task>,
    config: PlanConfig,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default error policy applied to tasks without an override.
    /// A fresh plan defaults to [`ErrorPolicy::StopAll`].
    pub fn with_default_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.config.default_policy = policy;
        self
    }

    /// Install a lifecycle [`Observer`].
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.config.observer = observer;
        self
    }

    /// Install the executor that realizes declarative op tasks. An op task
    /// run without one fails at execution time.
    pub fn with_executor<E>(mut self, executor: E) -> Self
    where
        E: OpExecutor + 'static,
    {
        self.config.executor = Some(Arc::new(executor));
        self
    }

    /// Append a declarative task wrapping `op`. Name uniqueness is checked
    /// by [`Plan::validate`], not here.
    pub fn add_op_task(&mut self, name: impl Into<String>, op: Op) -> TaskId {
        self.push(Task::new(name.into(), TaskBody::Op(op)))
    }

    /// Append a functional task. The body is invoked with the run's
    /// cancellation token, once per attempt.
    pub fn add_fn_task<F, Fut>(&mut self, name: impl Into<String>, body: F) -> TaskId
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Outcome>> + Send + 'static,
    {
        let body: TaskFn = Box::new(move |cancel| -> TaskFuture { Box::pin(body(cancel)) });
        self.push(Task::new(name.into(), TaskBody::Func(body)))
    }

    fn push(&mut self, task: Task) -> TaskId {
        debug!(task = %task.name(), "task added to plan");
        self.tasks.push(task);

        TaskId(self.tasks.len() - 1)
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Resolve a handle.
    ///
    /// # Panics
    /// Panics if `id` did not come from this plan.
    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.index()]
    }

    /// Resolve a handle mutably, for the builder-style task methods:
    ///
    /// ```ignore
    /// plan.task_mut(deploy).depends_on([build, migrate]).only_if_changed();
    /// ```
    ///
    /// # Panics
    /// Panics if `id` did not come from this plan.
    pub fn task_mut(&mut self, id: TaskId) -> &mut Task {
        &mut self.tasks[id.index()]
    }

    /// Check the plan for structural errors: duplicate names, dependency
    /// handles that do not resolve, and cycles. Returns the first failure.
    pub fn validate(&self) -> Result<(), PlanError> {
        validate::validate(&self.tasks)
    }

    /// The wave decomposition: tasks grouped so that every task's
    /// dependencies sit in earlier waves. Validates first.
    ///
    /// Pure with respect to run state; repeated calls on an unchanged plan
    /// return identical groupings.
    pub fn waves(&self) -> Result<Vec<Vec<TaskId>>, PlanError> {
        self.validate()?;

        Ok(levelize(&self.tasks))
    }

    /// Human-readable rendering of the execution plan: waves, parallelism,
    /// each task's body kind, dependencies, and skip markers.
    pub fn explain(&self) -> String {
        match self.waves() {
            Ok(waves) => self.render(&waves),
            Err(err) => format!("invalid plan: {err}"),
        }
    }

    /// Validate, levelize, and execute the plan.
    ///
    /// `cancel` is propagated to every task body and executor call. On a
    /// fatal task failure the error comes back as [`RunError::Aborted`]
    /// carrying the partial [`Report`]; structural errors surface before
    /// anything runs.
    pub async fn run(self, cancel: CancellationToken) -> Result<Report, RunError> {
        self.validate()?;

        let waves = levelize(&self.tasks);
        let explain = self.render(&waves);

        Runner::new(self.tasks, self.config, waves, explain)
            .run(cancel)
            .await
    }

    /// Render the explain text for an already-validated decomposition.
    fn render(&self, waves: &[Vec<TaskId>]) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Plan: {} tasks, {} waves", self.tasks.len(), waves.len());

        for (i, wave) in waves.iter().enumerate() {
            if wave.len() > 1 {
                let _ = write!(out, "\nWave {i} (parallel):\n");
            } else {
                let _ = write!(out, "\nWave {i}:\n");
            }

            for &id in wave {
                let task = &self.tasks[id.index()];
                let kind = if task.is_func() { "fn" } else { "op" };

                let _ = write!(out, "  {} [{}]", task.name(), kind);

                if !task.dependencies().is_empty() {
                    let names: Vec<&str> = task
                        .dependencies()
                        .iter()
                        .map(|&d| self.tasks[d.index()].name())
                        .collect();

                    let _ = write!(out, " <- {}", names.join(", "));
                }

                let mut flags = Vec::new();
                if task.requires_change() {
                    flags.push("only-if-changed");
                }
                if task.guard.is_some() {
                    flags.push("when");
                }

                if !flags.is_empty() {
                    let _ = write!(out, " ({})", flags.join(", "));
                }

                out.push('\n');
            }
        }

        out
    }
}
