use super::*;
use std::collections::HashSet;

#[rstest]
#[tokio::test]
async fn create_returns_distinct_ids(registry: Arc<TestRegistry>) {
    let mut ids = HashSet::new();
    for _ in 0..50 {
        ids.insert(registry.create("orders").await.unwrap());
    }

    assert_eq!(ids.len(), 50);
    assert_eq!(registry.len(), 50);
}

#[rstest]
#[tokio::test]
async fn id_is_used_as_consumer_group(registry: Arc<TestRegistry>) {
    let id = registry.create("orders").await.unwrap();

    assert_eq!(registry.broker().groups(), vec![id.to_string()]);
}

#[rstest]
#[tokio::test]
async fn get_returns_subscription_metadata(registry: Arc<TestRegistry>) {
    let id = registry.create("orders").await.unwrap();

    let sub = registry.get(id).unwrap();

    assert_eq!(sub.id(), id);
    assert_eq!(sub.topic(), "orders");
    assert!(registry.get(Uuid::new_v4()).is_none());
}

#[rstest]
#[tokio::test]
async fn remove_is_idempotent(registry: Arc<TestRegistry>) {
    let id = registry.create("orders").await.unwrap();

    assert!(registry.remove(id).await);
    assert!(!registry.remove(id).await);
    assert!(!registry.remove(Uuid::new_v4()).await);
    assert!(registry.get(id).is_none());
    assert_eq!(registry.broker().disconnects(), 1);
}

#[rstest]
#[tokio::test]
async fn failed_disconnect_still_evicts(registry: Arc<TestRegistry>) {
    let id = registry.create("orders").await.unwrap();
    registry.broker().refuse_disconnect();

    assert!(registry.remove(id).await);
    assert!(registry.is_empty());
    assert!(matches!(registry.fetch(id).await, Err(BridgeError::NotFound(_))));
}

#[rstest]
#[tokio::test]
async fn refused_connect_registers_nothing(registry: Arc<TestRegistry>) {
    registry.broker().refuse_connect();

    let result = registry.create("orders").await;

    assert!(matches!(result, Err(BridgeError::Connect(_))));
    assert!(registry.is_empty());
}

#[rstest]
#[tokio::test]
async fn list_ids_survives_removal_during_scan(registry: Arc<TestRegistry>) {
    let mut created = HashSet::new();
    for _ in 0..10 {
        created.insert(registry.create("orders").await.unwrap());
    }

    let snapshot = registry.list_ids();
    let mut visited = HashSet::new();
    for id in snapshot {
        assert!(visited.insert(id));
        registry.remove(id).await;
        let _ = registry.create("orders").await.unwrap();
    }

    assert_eq!(visited, created);
    assert_eq!(registry.len(), 10);
}
