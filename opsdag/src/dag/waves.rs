// src/dag/waves.rs

use crate::task::{Task, TaskId};

/// Group `tasks` into execution waves.
///
/// Every task lands in exactly one wave, all of a task's dependencies land in
/// earlier waves, and wave indices are minimal: a task's wave is one more
/// than the deepest wave among its dependencies (zero for tasks with no
/// dependencies). Tasks within a wave keep plan insertion order, so the
/// decomposition is deterministic for a given plan.
///
/// This is a pure function of the task set. It assumes the input already
/// passed validation -- acyclic, with every `TaskId` resolving into `tasks`.
/// [`Plan::waves`](crate::plan::Plan::waves) and
/// [`Plan::run`](crate::plan::Plan::run) always validate first.
pub fn levelize(tasks: &[Task]) -> Vec<Vec<TaskId>> {
    let mut memo: Vec<Option<usize>> = vec![None; tasks.len()];

    let depth: Vec<usize> = (0..tasks.len())
        .map(|id| wave_of(tasks, &mut memo, id))
        .collect();

    let count = depth.iter().max().map_or(0, |m| m + 1);
    let mut waves = vec![Vec::new(); count];

    for (id, &w) in depth.iter().enumerate() {
        waves[w].push(TaskId(id));
    }

    waves
}

/// Memoized longest path to a root, which bounds the whole decomposition at
/// O(V + E).
fn wave_of(tasks: &[Task], memo: &mut Vec<Option<usize>>, id: usize) -> usize {
    if let Some(w) = memo[id] {
        return w;
    }

    let mut wave = 0;
    for dep in tasks[id].dependencies() {
        wave = wave.max(wave_of(tasks, memo, dep.index()) + 1);
    }

    memo[id] = Some(wave);
    wave
}
