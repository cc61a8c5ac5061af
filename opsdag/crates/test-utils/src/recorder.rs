use std::sync::{Arc, Mutex};

use opsdag::Observer;

/// Shared, thread-safe log of lifecycle events rendered as strings.
///
/// Events use stable shapes so tests can assert exact sequences:
/// `before-plan`, `before-wave-0`, `before-<task>`, `retry-<task>-<n>`,
/// `skip-<task>:<reason>`, `after-<task>`, `after-wave-0`, `after-plan`.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Events matching a prefix, e.g. `"retry-"`.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }
}

/// An [`Observer`] with every callback set, recording into `log`.
pub fn recording_observer(log: &EventLog) -> Observer {
    let on_before_plan = log.clone();
    let on_before_wave = log.clone();
    let on_before_task = log.clone();
    let on_retry = log.clone();
    let on_skip = log.clone();
    let on_after_task = log.clone();
    let on_after_wave = log.clone();
    let on_after_plan = log.clone();

    Observer {
        before_plan: Some(Box::new(move |_explain| {
            on_before_plan.push("before-plan");
        })),
        before_wave: Some(Box::new(move |index, _tasks, _parallel| {
            on_before_wave.push(format!("before-wave-{index}"));
        })),
        before_task: Some(Box::new(move |task| {
            on_before_task.push(format!("before-{}", task.name()));
        })),
        on_retry: Some(Box::new(move |task, attempt, _err| {
            on_retry.push(format!("retry-{}-{attempt}", task.name()));
        })),
        on_skip: Some(Box::new(move |task, reason| {
            on_skip.push(format!("skip-{}:{reason}", task.name()));
        })),
        after_task: Some(Box::new(move |task, _result| {
            on_after_task.push(format!("after-{}", task.name()));
        })),
        after_wave: Some(Box::new(move |index, _results| {
            on_after_wave.push(format!("after-wave-{index}"));
        })),
        after_plan: Some(Box::new(move |_report| {
            on_after_plan.push("after-plan");
        })),
    }
}
