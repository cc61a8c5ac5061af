// src/engine/runner.rs

//! The stateful engine driving a validated plan: wave-by-wave dispatch,
//! guard evaluation, error policy, result recording, observer callbacks.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::Observer;
use crate::errors::RunError;
use crate::exec::OpExecutor;
use crate::outcome::{Outcome, Report, Results, Status, TaskResult};
use crate::plan::PlanConfig;
use crate::policy::ErrorPolicy;
use crate::task::{Task, TaskBody, TaskId};

/// Shared run state, guarded by a single mutex. Critical sections are small:
/// guards read under the lock, completions write under it.
#[derive(Default)]
struct RunState {
    /// Outcomes of tasks that completed, keyed by name.
    results: Results,
    /// Tasks whose failure propagates downstream: failed tasks plus tasks
    /// skipped because a dependency failed.
    failed: HashSet<TaskId>,
}

/// Everything a worker needs, shared across the whole run.
struct RunCtx {
    tasks: Vec<Task>,
    state: Mutex<RunState>,
    observer: Observer,
    executor: Option<Arc<dyn OpExecutor>>,
    default_policy: ErrorPolicy,
}

impl RunCtx {
    /// A poisoned lock means a guard or callback panicked on another worker;
    /// the state itself is still consistent, so keep going.
    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.index()]
    }
}

/// Executes a validated plan. Constructed by [`Plan::run`](crate::plan::Plan::run).
pub(crate) struct Runner {
    ctx: Arc<RunCtx>,
    waves: Vec<Vec<TaskId>>,
    explain: String,
}

impl Runner {
    pub(crate) fn new(
        tasks: Vec<Task>,
        config: PlanConfig,
        waves: Vec<Vec<TaskId>>,
        explain: String,
    ) -> Self {
        Self {
            ctx: Arc::new(RunCtx {
                tasks,
                state: Mutex::new(RunState::default()),
                observer: config.observer,
                executor: config.executor,
                default_policy: config.default_policy,
            }),
            waves,
            explain,
        }
    }

    /// Drive every wave to completion, or stop early on a fatal failure or a
    /// cancelled token. Fires `after_plan` exactly once on every path.
    pub(crate) async fn run(self, cancel: CancellationToken) -> Result<Report, RunError> {
        let start = Instant::now();
        let ctx = &self.ctx;

        info!(
            tasks = ctx.tasks.len(),
            waves = self.waves.len(),
            "starting plan run"
        );

        if let Some(cb) = &ctx.observer.before_plan {
            cb(&self.explain);
        }

        let mut task_results: Vec<TaskResult> = Vec::with_capacity(ctx.tasks.len());
        let mut abort: Option<(String, Arc<anyhow::Error>)> = None;

        for (index, wave) in self.waves.iter().enumerate() {
            let parallel = wave.len() > 1;

            if let Some(cb) = &ctx.observer.before_wave {
                let tasks: Vec<&Task> = wave.iter().map(|&id| ctx.task(id)).collect();
                cb(index, &tasks, parallel);
            }

            debug!(wave = index, size = wave.len(), parallel, "dispatching wave");

            let wave_results = run_wave(ctx, wave, &cancel).await;

            if let Some(cb) = &ctx.observer.after_wave {
                cb(index, &wave_results);
            }

            // Wave abort decision: a failure under any effective policy
            // other than `continue` is fatal. Retries are already exhausted
            // by the time a result reads FAILED.
            for (result, &id) in wave_results.iter().zip(wave) {
                if result.status != Status::Failed {
                    continue;
                }

                let policy = ctx.task(id).error_policy().unwrap_or(ctx.default_policy);
                if policy != ErrorPolicy::Continue {
                    let error = result
                        .error
                        .clone()
                        .unwrap_or_else(|| Arc::new(anyhow::anyhow!("task failed")));
                    abort = Some((result.name.clone(), error));
                    break;
                }
            }

            task_results.extend(wave_results);

            if abort.is_some() {
                break;
            }

            if cancel.is_cancelled() {
                info!(completed_waves = index + 1, "run cancelled; later waves not started");
                break;
            }
        }

        let report = Report {
            tasks: task_results,
            duration: start.elapsed(),
        };

        if let Some(cb) = &ctx.observer.after_plan {
            cb(&report);
        }

        match abort {
            Some((task, error)) => {
                warn!(task = %task, error = %error, "plan run aborted");
                Err(RunError::Aborted {
                    task,
                    error,
                    report,
                })
            }
            None => {
                info!(summary = %report.summary(), "plan run complete");
                Ok(report)
            }
        }
    }
}

/// Dispatch every task in the wave concurrently and collect results in the
/// wave's task order.
async fn run_wave(
    ctx: &Arc<RunCtx>,
    wave: &[TaskId],
    cancel: &CancellationToken,
) -> Vec<TaskResult> {
    let mut handles: Vec<(TaskId, JoinHandle<TaskResult>)> = Vec::with_capacity(wave.len());

    for &id in wave {
        let ctx = Arc::clone(ctx);
        let cancel = cancel.clone();

        handles.push((
            id,
            tokio::spawn(async move { run_task(&ctx, id, cancel).await }),
        ));
    }

    let mut results = Vec::with_capacity(handles.len());

    for (id, handle) in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(err) => {
                // A panicking body takes down only its own task.
                let task = ctx.task(id);
                warn!(task = %task.name(), error = %err, "task worker panicked");

                ctx.lock_state().failed.insert(id);

                let result = TaskResult {
                    name: task.name().to_string(),
                    status: Status::Failed,
                    changed: false,
                    duration: Duration::ZERO,
                    error: Some(Arc::new(anyhow::anyhow!("task panicked: {err}"))),
                };

                if let Some(cb) = &ctx.observer.after_task {
                    cb(task, &result);
                }

                results.push(result);
            }
        }
    }

    results
}

/// Drive one task through guards, execution with retries, and recording.
async fn run_task(ctx: &RunCtx, id: TaskId, cancel: CancellationToken) -> TaskResult {
    let start = Instant::now();
    let task = ctx.task(id);

    // Dependency-failure gate. A hit also marks this task in the failed-set
    // so the skip propagates to its own dependents.
    {
        let mut state = ctx.lock_state();
        if task.dependencies().iter().any(|d| state.failed.contains(d)) {
            state.failed.insert(id);
            drop(state);

            return skip(ctx, task, "dependency failed", start);
        }
    }

    // Change gate: run only if some direct dependency recorded a change.
    if task.requires_change() {
        let any_changed = {
            let state = ctx.lock_state();
            task.dependencies()
                .iter()
                .any(|&d| state.results.changed(ctx.task(d).name()))
        };

        if !any_changed {
            return skip(ctx, task, "no dependencies changed", start);
        }
    }

    // Custom guard, evaluated under the lock against the live results map.
    // Guards are required to be fast and non-blocking.
    if let Some(guard) = &task.guard {
        let should_run = {
            let state = ctx.lock_state();
            guard(&state.results)
        };

        if !should_run {
            return skip(ctx, task, "guard returned false", start);
        }
    }

    if let Some(cb) = &ctx.observer.before_task {
        cb(task);
    }

    let policy = task.error_policy().unwrap_or(ctx.default_policy);
    let max_attempts = policy.max_attempts();

    let mut attempt = 0;
    let body_result = loop {
        match execute_body(ctx, task, &cancel).await {
            Ok(outcome) => break Ok(outcome),
            Err(err) => {
                attempt += 1;

                if attempt >= max_attempts {
                    break Err(err);
                }

                warn!(
                    task = %task.name(),
                    attempt,
                    max_attempts,
                    error = %err,
                    "task attempt failed; retrying"
                );

                if let Some(cb) = &ctx.observer.on_retry {
                    cb(task, attempt, &err);
                }
            }
        }
    };

    let duration = start.elapsed();

    let result = match body_result {
        Ok(outcome) => {
            let changed = outcome.changed;
            let status = if changed {
                Status::Changed
            } else {
                Status::Unchanged
            };

            ctx.lock_state()
                .results
                .insert(task.name().to_string(), outcome);

            debug!(task = %task.name(), status = %status, ?duration, "task complete");

            TaskResult {
                name: task.name().to_string(),
                status,
                changed,
                duration,
                error: None,
            }
        }
        Err(err) => {
            ctx.lock_state().failed.insert(id);

            warn!(task = %task.name(), error = %err, ?duration, "task failed");

            TaskResult {
                name: task.name().to_string(),
                status: Status::Failed,
                changed: false,
                duration,
                error: Some(Arc::new(err)),
            }
        }
    };

    if let Some(cb) = &ctx.observer.after_task {
        cb(task, &result);
    }

    result
}

/// Run the task body once: functional bodies directly, op bodies through the
/// plan's executor.
async fn execute_body(
    ctx: &RunCtx,
    task: &Task,
    cancel: &CancellationToken,
) -> anyhow::Result<Outcome> {
    match &task.body {
        TaskBody::Func(body) => body(cancel.clone()).await,
        TaskBody::Op(op) => match &ctx.executor {
            Some(executor) => executor.execute(cancel, op).await,
            None => Err(anyhow::anyhow!(
                "op task {:?} requires an operation executor",
                task.name()
            )),
        },
    }
}

/// Record a guard-initiated skip and fire its events.
fn skip(ctx: &RunCtx, task: &Task, reason: &str, start: Instant) -> TaskResult {
    debug!(task = %task.name(), reason, "task skipped");

    if let Some(cb) = &ctx.observer.on_skip {
        cb(task, reason);
    }

    let result = TaskResult {
        name: task.name().to_string(),
        status: Status::Skipped,
        changed: false,
        duration: start.elapsed(),
        error: None,
    };

    if let Some(cb) = &ctx.observer.after_task {
        cb(task, &result);
    }

    result
}
