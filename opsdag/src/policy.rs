// src/policy.rs

/// How the runner reacts when a task body fails.
///
/// A per-task override (via [`Task::on_error`](crate::task::Task::on_error))
/// takes precedence over the plan default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort the run after the current wave on the first failure.
    StopAll,
    /// Record the failure, skip its transitive dependents, keep unrelated
    /// tasks running.
    Continue,
    /// Re-attempt the body up to `n` extra times, then behave like
    /// [`ErrorPolicy::StopAll`].
    Retry(u32),
}

impl ErrorPolicy {
    /// Total attempts the runner will make: 1, plus retries if any.
    pub fn max_attempts(&self) -> u32 {
        match self {
            ErrorPolicy::Retry(n) => 1 + n,
            _ => 1,
        }
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        ErrorPolicy::StopAll
    }
}

impl std::fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorPolicy::StopAll => f.write_str("stop_all"),
            ErrorPolicy::Continue => f.write_str("continue"),
            ErrorPolicy::Retry(n) => write!(f, "retry({n})"),
        }
    }
}
