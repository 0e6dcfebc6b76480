use std::{sync::Arc, time::Duration};

use config_loader::{FileFormat, StressScenarioConfig, load_config_from_str};
use task_scope::{AtomicCounter, GuardedCounter, MutexCounter, Scope, TaskState, TaskStop};
use tokio::time::sleep;

#[tokio::test]
async fn test_counter_small_counts() {
    let counter = AtomicCounter::new(0);
    assert_eq!(counter.get().await, 0);
    assert_eq!(counter.increment().await, 1);
    assert_eq!(counter.get().await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_thousand_concurrent_increments_both_strategies() {
    let atomic = Arc::new(AtomicCounter::new(0));
    let locked = Arc::new(MutexCounter::new(0));

    let scope = Scope::new("contention");
    let a = atomic.clone();
    let m = locked.clone();
    scope.spawn_many("incr", 1000, move |_, _token| {
        let atomic = a.clone();
        let locked = m.clone();
        async move {
            atomic.increment().await;
            locked.increment().await;
            Ok(())
        }
    });

    scope.await_all().await.unwrap();
    assert_eq!(atomic.get().await, 1000);
    assert_eq!(locked.get().await, 1000);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_default_scenario_yields_exactly_100000() {
    let cfg = StressScenarioConfig::default();
    assert_eq!(cfg.expected_total(), 100_000);

    let counter = Arc::new(AtomicCounter::new(0));

    for s in 0..cfg.scopes {
        let scope = Scope::new(format!("scenario-{s}"));
        let shared = counter.clone();
        scope.spawn_many("incr", cfg.tasks_per_scope, move |_, _token| {
            let counter = shared.clone();
            let n = cfg.increments_per_task;
            async move {
                for _ in 0..n {
                    counter.increment().await;
                }
                Ok(())
            }
        });
        scope.await_all().await.unwrap();
    }

    assert_eq!(counter.get().await, cfg.expected_total());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_million_increments_scenario_from_config() {
    let cfg: StressScenarioConfig = load_config_from_str(
        r#"{ "scopes": 1, "tasks_per_scope": 100, "increments_per_task": 10000 }"#,
        FileFormat::Json,
    )
    .unwrap();
    assert_eq!(cfg.expected_total(), 1_000_000);

    let counter = Arc::new(AtomicCounter::new(0));
    let scope = Scope::new("million");
    let shared = counter.clone();
    scope.spawn_many("incr", cfg.tasks_per_scope, move |_, _token| {
        let counter = shared.clone();
        let n = cfg.increments_per_task;
        async move {
            for _ in 0..n {
                counter.increment().await;
            }
            Ok(())
        }
    });

    scope.await_all().await.unwrap();
    assert_eq!(counter.get().await, 1_000_000);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fault_makes_every_sibling_token_observe_cancellation() {
    let scope = Scope::new("broadcast");
    let handles = scope.spawn_many("watcher", 50, |_, token| async move {
        token.cancelled().await;
        Err(TaskStop::cancelled())
    });

    scope.spawn("faulty", |_token| async {
        sleep(Duration::from_millis(5)).await;
        Err(TaskStop::execution("collapse"))
    });

    let err = scope.await_all().await.unwrap_err();
    assert_eq!(err.task_name, "faulty");
    for handle in &handles {
        assert!(handle.is_cancelled());
        assert_eq!(handle.state(), TaskState::Cancelled);
    }
}
