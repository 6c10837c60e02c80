use super::*;
use tokio::time::{Instant, advance};

#[rstest]
#[tokio::test(start_paused = true)]
async fn expiry_counts_from_creation_only(registry: Arc<TestRegistry>) {
    let id = registry.create("orders").await.unwrap();

    advance(Duration::from_secs(599)).await;
    registry.fetch(id).await.unwrap();
    assert_eq!(registry.sweep_expired(Instant::now()).await, 0);
    assert!(registry.get(id).is_some());

    advance(Duration::from_secs(1)).await;
    assert_eq!(registry.sweep_expired(Instant::now()).await, 1);
    assert!(registry.get(id).is_none());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn subscription_created_with_sweeper_is_gone_by_650s(registry: Arc<TestRegistry>) {
    let context = Context::new();
    sweeper::launch(&context, Arc::clone(&registry), Duration::from_secs(60)).await;
    let id = registry.create("orders").await.unwrap();

    sleep(Duration::from_secs(590)).await;
    assert!(registry.fetch(id).await.is_ok());

    sleep(Duration::from_secs(60)).await;
    assert!(matches!(registry.fetch(id).await, Err(BridgeError::NotFound(_))));
    assert!(!registry.list_ids().contains(&id));

    context.shutdown().await;
    context.all_done().await;
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn sweep_only_evicts_expired(registry: Arc<TestRegistry>) {
    let old = registry.create("orders").await.unwrap();
    advance(Duration::from_secs(300)).await;
    let young = registry.create("orders").await.unwrap();
    advance(Duration::from_secs(301)).await;

    assert_eq!(registry.sweep_expired(Instant::now()).await, 1);
    assert_eq!(registry.list_ids(), vec![young]);
    assert!(matches!(registry.fetch(old).await, Err(BridgeError::NotFound(_))));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn sweeper_evicts_on_next_tick_after_lifetime(registry: Arc<TestRegistry>) {
    let context = Context::new();
    sweeper::launch(&context, Arc::clone(&registry), Duration::from_secs(60)).await;
    sleep(Duration::from_secs(30)).await;

    let id = registry.create("orders").await.unwrap();
    registry.broker().publish("orders", record(b"m0"));

    sleep(Duration::from_secs(590)).await;
    assert_eq!(registry.fetch(id).await.unwrap().len(), 1);

    sleep(Duration::from_secs(60)).await;
    assert!(matches!(registry.fetch(id).await, Err(BridgeError::NotFound(_))));
    assert!(registry.list_ids().is_empty());
    assert_eq!(registry.broker().disconnects(), 1);

    context.shutdown().await;
    context.all_done().await;
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn shutdown_stops_sweeper(registry: Arc<TestRegistry>) {
    let context = Context::new();
    sweeper::launch(&context, Arc::clone(&registry), Duration::from_secs(60)).await;
    let id = registry.create("orders").await.unwrap();

    context.shutdown().await;
    sleep(Duration::from_secs(3600)).await;

    assert!(registry.get(id).is_some());
    context.all_done().await;
}
