// src/engine/observer.rs

use crate::outcome::{Report, TaskResult};
use crate::task::Task;

/// Sink of structured lifecycle events emitted by the runner.
///
/// An observer is a record of optional callbacks; unset callbacks are
/// no-ops. Callbacks run synchronously on whichever worker detected the
/// event -- `after_task` in particular may fire from any worker -- so
/// closures must handle their own synchronization.
///
/// ```ignore
/// let observer = Observer {
///     after_task: Some(Box::new(|task, result| {
///         println!("{}: {}", task.name(), result.status);
///     })),
///     ..Observer::default()
/// };
/// ```
#[derive(Default)]
pub struct Observer {
    /// Once, with the plan explanation text, before the first wave.
    pub before_plan: Option<Box<dyn Fn(&str) + Send + Sync>>,

    /// Before each wave: index, tasks in the wave, and whether the wave runs
    /// more than one task in parallel.
    pub before_wave: Option<Box<dyn Fn(usize, &[&Task], bool) + Send + Sync>>,

    /// Immediately before a task body runs, after its guards pass.
    pub before_task: Option<Box<dyn Fn(&Task) + Send + Sync>>,

    /// Between body attempts: the 1-based attempt number that just failed,
    /// and its error.
    pub on_retry: Option<Box<dyn Fn(&Task, u32, &anyhow::Error) + Send + Sync>>,

    /// When a guard skips a task, with the reason.
    pub on_skip: Option<Box<dyn Fn(&Task, &str) + Send + Sync>>,

    /// For every task the runner records, on every outcome.
    pub after_task: Option<Box<dyn Fn(&Task, &TaskResult) + Send + Sync>>,

    /// After all tasks in a wave finish: index and the wave's results.
    pub after_wave: Option<Box<dyn Fn(usize, &[TaskResult]) + Send + Sync>>,

    /// Exactly once, with the final report, even when the run aborted.
    pub after_plan: Option<Box<dyn Fn(&Report) + Send + Sync>>,
}
