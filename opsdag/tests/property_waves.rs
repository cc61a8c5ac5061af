// tests/property_waves.rs

use std::collections::HashMap;

use proptest::prelude::*;

use opsdag::{Op, Plan, TaskId};

// Strategy for a valid DAG shape: task N may only depend on tasks 0..N-1,
// which guarantees acyclicity by construction.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(move |raw_deps| {
            raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let mut deps: Vec<usize> = potential
                        .into_iter()
                        .filter(|_| i > 0)
                        .map(|d| d % i)
                        .collect();
                    deps.sort_unstable();
                    deps.dedup();
                    deps
                })
                .collect()
        })
    })
}

fn build_plan(deps: &[Vec<usize>]) -> (Plan, Vec<TaskId>) {
    let mut plan = Plan::new();

    let ids: Vec<TaskId> = (0..deps.len())
        .map(|i| plan.add_op_task(format!("task_{i}"), Op::new("noop", "_any")))
        .collect();

    for (i, task_deps) in deps.iter().enumerate() {
        let handles: Vec<TaskId> = task_deps.iter().map(|&d| ids[d]).collect();
        plan.task_mut(ids[i]).depends_on(handles);
    }

    (plan, ids)
}

proptest! {
    #[test]
    fn every_task_lands_in_exactly_one_minimal_wave(deps in dag_strategy(12)) {
        let (plan, ids) = build_plan(&deps);

        let waves = plan.waves().unwrap();

        let mut wave_of: HashMap<TaskId, usize> = HashMap::new();
        for (w, wave) in waves.iter().enumerate() {
            prop_assert!(!wave.is_empty(), "wave {} is empty", w);
            for &id in wave {
                prop_assert!(
                    wave_of.insert(id, w).is_none(),
                    "task appears in more than one wave"
                );
            }
        }
        prop_assert_eq!(wave_of.len(), deps.len());

        for (i, task_deps) in deps.iter().enumerate() {
            // Every dependency sits in a strictly earlier wave.
            for &d in task_deps {
                prop_assert!(wave_of[&ids[d]] < wave_of[&ids[i]]);
            }

            // And the wave index is minimal: one past the deepest dependency.
            let expected = task_deps
                .iter()
                .map(|&d| wave_of[&ids[d]] + 1)
                .max()
                .unwrap_or(0);
            prop_assert_eq!(wave_of[&ids[i]], expected);
        }
    }

    #[test]
    fn waves_preserve_insertion_order_and_are_stable(deps in dag_strategy(10)) {
        let (plan, ids) = build_plan(&deps);

        let position: HashMap<TaskId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let waves = plan.waves().unwrap();

        for wave in &waves {
            for pair in wave.windows(2) {
                prop_assert!(position[&pair[0]] < position[&pair[1]]);
            }
        }

        // Decomposition is a pure function of the plan.
        prop_assert_eq!(plan.waves().unwrap(), waves);
    }
}
