// tests/observer_events.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use opsdag::{ErrorPolicy, Observer, Outcome, Plan};
use opsdag_test_utils::init_tracing;
use opsdag_test_utils::recorder::{recording_observer, EventLog};

#[tokio::test]
async fn events_fire_in_documented_order() {
    init_tracing();

    let mut plan = Plan::new();

    let a = plan.add_fn_task("a", |_cancel| async { Ok(Outcome::new(true)) });
    let b = plan.add_fn_task("b", |_cancel| async { Ok(Outcome::new(false)) });
    plan.task_mut(b).depends_on([a]);

    let log = EventLog::new();
    let plan = plan.with_observer(recording_observer(&log));

    plan.run(CancellationToken::new()).await.unwrap();

    assert_eq!(
        log.snapshot(),
        vec![
            "before-plan",
            "before-wave-0",
            "before-a",
            "after-a",
            "after-wave-0",
            "before-wave-1",
            "before-b",
            "after-b",
            "after-wave-1",
            "after-plan",
        ]
    );
}

#[tokio::test]
async fn skipped_task_fires_skip_then_after_task_and_no_before_task() {
    init_tracing();

    let mut plan = Plan::new();

    let dep = plan.add_fn_task("dep", |_cancel| async { Ok(Outcome::new(false)) });
    let child = plan.add_fn_task("child", |_cancel| async { Ok(Outcome::new(true)) });
    plan.task_mut(child).depends_on([dep]).only_if_changed();

    let log = EventLog::new();
    let plan = plan.with_observer(recording_observer(&log));

    plan.run(CancellationToken::new()).await.unwrap();

    let events = log.snapshot();
    let skip_at = events
        .iter()
        .position(|e| e.starts_with("skip-child"))
        .expect("skip event missing");
    let after_at = events
        .iter()
        .position(|e| e == "after-child")
        .expect("after-task event missing");

    assert!(skip_at < after_at);
    assert!(!events.contains(&"before-child".to_string()));
}

#[tokio::test]
async fn after_task_count_matches_report_on_mixed_outcomes() {
    init_tracing();

    let after_tasks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&after_tasks);

    let observer = Observer {
        after_task: Some(Box::new(move |_task, _result| {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
        ..Observer::default()
    };

    let mut plan = Plan::new()
        .with_default_error_policy(ErrorPolicy::Continue)
        .with_observer(observer);

    let a = plan.add_fn_task("a", |_cancel| async { Err(anyhow::anyhow!("boom")) });
    let b = plan.add_fn_task("b", |_cancel| async { Ok(Outcome::new(true)) });
    let c = plan.add_fn_task("c", |_cancel| async { Ok(Outcome::new(false)) });
    let d = plan.add_fn_task("d", |_cancel| async { Ok(Outcome::new(true)) });

    plan.task_mut(b).depends_on([a]);
    plan.task_mut(d).depends_on([c]).only_if_changed();

    let report = plan.run(CancellationToken::new()).await.unwrap();

    assert_eq!(after_tasks.load(Ordering::SeqCst), report.tasks.len());
}

#[tokio::test]
async fn aborted_run_still_ends_with_after_plan() {
    init_tracing();

    let mut plan = Plan::new();
    plan.add_fn_task("fail", |_cancel| async { Err(anyhow::anyhow!("boom")) });

    let log = EventLog::new();
    let plan = plan.with_observer(recording_observer(&log));

    plan.run(CancellationToken::new()).await.unwrap_err();

    let events = log.snapshot();
    assert_eq!(events.first().map(String::as_str), Some("before-plan"));
    assert_eq!(events.last().map(String::as_str), Some("after-plan"));
    assert!(events.contains(&"after-wave-0".to_string()));
}

#[tokio::test]
async fn before_plan_receives_the_explain_text() {
    init_tracing();

    let mut plan = Plan::new();
    plan.add_fn_task("solo", |_cancel| async { Ok(Outcome::new(true)) });

    let seen = Arc::new(std::sync::Mutex::new(String::new()));
    let sink = Arc::clone(&seen);

    let observer = Observer {
        before_plan: Some(Box::new(move |explain| {
            *sink.lock().unwrap() = explain.to_string();
        })),
        ..Observer::default()
    };

    let plan = plan.with_observer(observer);
    plan.run(CancellationToken::new()).await.unwrap();

    let text = seen.lock().unwrap().clone();
    assert!(text.starts_with("Plan: 1 tasks, 1 waves"), "got: {text}");
    assert!(text.contains("solo [fn]"), "got: {text}");
}

#[tokio::test]
async fn unset_callbacks_are_ignored() {
    init_tracing();

    // Only after_plan is set; everything else must silently no-op.
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);

    let observer = Observer {
        after_plan: Some(Box::new(move |_report| {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
        ..Observer::default()
    };

    let mut plan = Plan::new().with_observer(observer);
    plan.add_fn_task("solo", |_cancel| async { Ok(Outcome::new(true)) });

    plan.run(CancellationToken::new()).await.unwrap();

    assert_eq!(fired.load(Ordering::SeqCst), 1);
}
