use super::*;
use crate::executor::ExecutorOptions;
use crate::test_utils::{db_error, explore, Script, StubPlatform};
use lo_api::PlatformClient;
use lo_core::{ExploreStatus, ModelName};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_cancel_wakes_blocked_waiters() {
    let token = CancelToken::new();
    let waiter = tokio::spawn({
        let token = token.clone();
        async move { token.cancelled().await }
    });
    tokio::task::yield_now().await;
    assert!(!token.is_cancelled());

    token.cancel();

    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .unwrap()
        .unwrap();
    assert!(token.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_late_subscriber_returns_immediately() {
    let token = CancelToken::new();
    token.cancel();
    token.cancel(); // idempotent

    tokio::time::timeout(Duration::from_secs(1), token.cancelled())
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_cancels_after_timeout() {
    let token = CancelToken::new();
    let watchdog = spawn_watchdog(token.clone(), Duration::from_secs(5));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(!token.is_cancelled());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(token.is_cancelled());
    watchdog.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_stands_down_on_external_cancel() {
    let token = CancelToken::new();
    let watchdog = spawn_watchdog(token.clone(), Duration::from_secs(60));

    token.cancel();

    tokio::time::timeout(Duration::from_secs(1), watchdog)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_run_explores_covers_every_explore() {
    let api = Arc::new(StubPlatform::new());
    api.script(
        "returns",
        &["returns.reason"],
        Script::Fail(vec![db_error("no such column")]),
    );
    let executor = Arc::new(QueryExecutor::new(
        Arc::clone(&api) as Arc<dyn PlatformClient>,
        CancelToken::new(),
        4,
        ExecutorOptions::default(),
    ));
    let model = Model {
        name: ModelName::new("ecommerce"),
        explores: vec![
            explore("ecommerce", "orders", &["orders.id", "orders.total"]),
            explore("ecommerce", "returns", &["returns.reason"]),
            explore("ecommerce", "empty", &[]),
        ],
    };

    let results = run_explores(executor, &model, &IsolateOptions::default()).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].explore.as_str(), "orders");
    assert_eq!(results[0].status, ExploreStatus::Passed);
    assert_eq!(results[1].explore.as_str(), "returns");
    assert_eq!(results[1].status, ExploreStatus::Errored);
    assert_eq!(results[2].explore.as_str(), "empty");
    assert_eq!(results[2].status, ExploreStatus::Skipped);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_reports_every_explore() {
    let api = Arc::new(StubPlatform::new());
    api.set_pending_polls(1000);
    let token = CancelToken::new();
    let executor = Arc::new(QueryExecutor::new(
        Arc::clone(&api) as Arc<dyn PlatformClient>,
        token.clone(),
        4,
        ExecutorOptions::default(),
    ));
    let model = Model {
        name: ModelName::new("ecommerce"),
        explores: vec![
            explore("ecommerce", "orders", &["orders.id"]),
            explore("ecommerce", "users", &["users.name"]),
        ],
    };

    let opts = IsolateOptions::default();
    let (results, ()) = tokio::join!(
        run_explores(executor, &model, &opts),
        async {
            tokio::time::sleep(Duration::from_millis(700)).await;
            token.cancel();
        },
    );

    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.status, ExploreStatus::Cancelled);
        assert!(result.errors.is_empty());
    }
}
