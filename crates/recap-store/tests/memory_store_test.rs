use std::time::Duration;

use recap_store::{connect, InMemoryStore, KeyValueStore};

#[tokio::test]
async fn test_set_get_delete() {
    let store = InMemoryStore::new();

    assert_eq!(store.get("memory:a").await.unwrap(), None);
    assert!(store.set("memory:a", "{}").await.unwrap());
    assert_eq!(store.get("memory:a").await.unwrap().as_deref(), Some("{}"));

    store.delete("memory:a").await.unwrap();
    assert_eq!(store.get("memory:a").await.unwrap(), None);

    // Deleting a missing key is not an error
    store.delete("memory:a").await.unwrap();
}

#[tokio::test]
async fn test_keys_filters_by_pattern_in_sorted_order() {
    let store = InMemoryStore::new();
    for key in ["memory:b", "summary:b", "memory:a", "summary_metadata"] {
        store.set(key, "v").await.unwrap();
    }

    assert_eq!(store.keys("memory:*").await.unwrap(), vec!["memory:a", "memory:b"]);
    assert_eq!(store.keys("*").await.unwrap().len(), 4);
    assert!(store.keys("nothing:*").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clones_share_state() {
    let store = InMemoryStore::new();
    let other = store.clone();

    store.set("k", "v").await.unwrap();
    assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));
    assert_eq!(other.len().await, 1);
}

#[tokio::test]
async fn test_set_if_absent_respects_live_holder() {
    let store = InMemoryStore::new();
    let ttl = Duration::from_secs(60);

    assert!(store.set_if_absent("summary_lock", "owner-1", ttl).await.unwrap());
    assert!(!store.set_if_absent("summary_lock", "owner-2", ttl).await.unwrap());
    assert_eq!(store.get("summary_lock").await.unwrap().as_deref(), Some("owner-1"));
}

#[tokio::test]
async fn test_set_if_absent_takes_over_expired_holder() {
    let store = InMemoryStore::new();

    assert!(store
        .set_if_absent("summary_lock", "owner-1", Duration::from_millis(10))
        .await
        .unwrap());
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(store.get("summary_lock").await.unwrap(), None);
    assert!(store
        .set_if_absent("summary_lock", "owner-2", Duration::from_secs(60))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_delete_if_equals_checks_owner() {
    let store = InMemoryStore::new();
    store
        .set_if_absent("summary_lock", "owner-1", Duration::from_secs(60))
        .await
        .unwrap();

    assert!(!store.delete_if_equals("summary_lock", "owner-2").await.unwrap());
    assert!(store.get("summary_lock").await.unwrap().is_some());

    assert!(store.delete_if_equals("summary_lock", "owner-1").await.unwrap());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_connect_memory_url() {
    let store = connect("memory://").await.unwrap();
    assert_eq!(store.backend_name(), "memory");
    store.ping().await.unwrap();
    assert!(store.set("k", "v").await.unwrap());
}

#[tokio::test]
async fn test_connect_rejects_unknown_scheme() {
    assert!(connect("sqlite://local.db").await.is_err());
}

#[tokio::test]
async fn test_get_many_aligns_with_requested_keys() {
    let store = InMemoryStore::new();
    store.set("memory:a", "1").await.unwrap();
    store.set("memory:c", "3").await.unwrap();
    store
        .set_if_absent("memory:gone", "x", Duration::from_millis(5))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let keys: Vec<String> = ["memory:c", "memory:b", "memory:gone", "memory:a"]
        .iter()
        .map(|k| k.to_string())
        .collect();
    let values = store.get_many(&keys).await.unwrap();
    assert_eq!(
        values,
        vec![Some("3".to_string()), None, None, Some("1".to_string())]
    );
    assert!(store.get_many(&[]).await.unwrap().is_empty());
}
