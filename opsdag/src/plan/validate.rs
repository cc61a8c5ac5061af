// src/plan/validate.rs

use std::collections::HashSet;

use crate::errors::PlanError;
use crate::task::Task;

/// Run structural validation against a task set.
///
/// This checks:
/// - task names are unique within the plan
/// - every dependency handle resolves to a task in the plan
/// - the dependency graph has no cycles (self-loops included)
///
/// Checks run in that order and the first failure wins.
pub(crate) fn validate(tasks: &[Task]) -> Result<(), PlanError> {
    check_unique_names(tasks)?;
    check_dependency_handles(tasks)?;
    detect_cycle(tasks)?;

    Ok(())
}

fn check_unique_names(tasks: &[Task]) -> Result<(), PlanError> {
    let mut seen = HashSet::with_capacity(tasks.len());

    for task in tasks {
        if !seen.insert(task.name()) {
            return Err(PlanError::DuplicateName(task.name().to_string()));
        }
    }

    Ok(())
}

fn check_dependency_handles(tasks: &[Task]) -> Result<(), PlanError> {
    for task in tasks {
        for dep in task.dependencies() {
            if dep.index() >= tasks.len() {
                return Err(PlanError::UnknownDependency {
                    task: task.name().to_string(),
                    id: *dep,
                });
            }
        }
    }

    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    /// Unvisited.
    White,
    /// In progress on the current DFS path.
    Gray,
    /// Done.
    Black,
}

/// Three-color depth-first traversal. An edge into a gray task closes a
/// cycle; the error names that edge.
fn detect_cycle(tasks: &[Task]) -> Result<(), PlanError> {
    let mut color = vec![Color::White; tasks.len()];

    for id in 0..tasks.len() {
        if color[id] == Color::White {
            visit(tasks, &mut color, id)?;
        }
    }

    Ok(())
}

fn visit(tasks: &[Task], color: &mut [Color], id: usize) -> Result<(), PlanError> {
    color[id] = Color::Gray;

    for dep in tasks[id].dependencies() {
        match color[dep.index()] {
            Color::Gray => {
                return Err(PlanError::Cycle {
                    from: tasks[id].name().to_string(),
                    to: tasks[dep.index()].name().to_string(),
                });
            }
            Color::White => visit(tasks, color, dep.index())?,
            Color::Black => {}
        }
    }

    color[id] = Color::Black;

    Ok(())
}
