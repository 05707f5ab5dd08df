use std::sync::Arc;

use stockwatch::{
    error::WatchError,
    models::{Direction, NewWatch, PriceSample, WatchId},
    services::{memory_store::MemoryWatchStore, watch_store::WatchStore},
};

const T0: i64 = 1_700_000_000;

fn new_watch(owner: &str, symbol: &str, target_price: f64, direction: Direction) -> NewWatch {
    NewWatch {
        owner: owner.to_string(),
        destination: format!("chat-{owner}"),
        symbol: symbol.to_string(),
        target_price,
        direction,
        created_at: T0,
    }
}

#[tokio::test]
async fn add_then_list_returns_exactly_one_fresh_watch() {
    let store = MemoryWatchStore::new();

    let w = store
        .add_watch(new_watch("alice", "5.HK", 50.0, Direction::Above))
        .await
        .unwrap();
    assert_eq!(w.symbol, "0005.HK");
    assert!(w.active);

    let listed = store.list_watches("alice").await.unwrap();
    assert_eq!(listed.len(), 1);
    let l = &listed[0];
    assert_eq!(l.id, w.id);
    assert_eq!(l.symbol, "0005.HK");
    assert_eq!(l.target_price, 50.0);
    assert_eq!(l.direction, Direction::Above);
    assert_eq!(l.destination, "chat-alice");
    assert_eq!(l.alert_count, 0);
    assert_eq!(l.last_checked_at, None);
    assert_eq!(l.last_alerted_at, None);
}

#[tokio::test]
async fn list_for_unknown_owner_is_empty() {
    let store = MemoryWatchStore::new();
    assert!(store.list_watches("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn list_is_newest_first() {
    let store = MemoryWatchStore::new();

    let mut first = new_watch("alice", "AAPL", 100.0, Direction::Above);
    first.created_at = T0;
    let mut second = new_watch("alice", "MSFT", 300.0, Direction::Below);
    second.created_at = T0 + 60;
    let mut third = new_watch("alice", "TSLA", 200.0, Direction::Above);
    third.created_at = T0 + 60;

    store.add_watch(first).await.unwrap();
    store.add_watch(second).await.unwrap();
    store.add_watch(third).await.unwrap();

    let symbols: Vec<String> = store
        .list_watches("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.symbol)
        .collect();
    assert_eq!(symbols, vec!["TSLA", "MSFT", "AAPL"]);
}

#[tokio::test]
async fn duplicate_active_watch_is_rejected_until_removed() {
    let store = MemoryWatchStore::new();

    let first = store
        .add_watch(new_watch("alice", "0005.HK", 50.0, Direction::Above))
        .await
        .unwrap();

    // "5" normalizes to the same key
    let err = store
        .add_watch(new_watch("alice", "5", 50.0, Direction::Above))
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::Duplicate { ref symbol, .. } if symbol == "0005.HK"));

    store.remove_watch("alice", first.id).await.unwrap();

    let again = store
        .add_watch(new_watch("alice", "5", 50.0, Direction::Above))
        .await
        .unwrap();
    assert_ne!(again.id, first.id);
    assert_eq!(store.list_watches("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn same_symbol_with_other_direction_or_owner_is_not_a_duplicate() {
    let store = MemoryWatchStore::new();

    store
        .add_watch(new_watch("alice", "AAPL", 150.0, Direction::Above))
        .await
        .unwrap();
    store
        .add_watch(new_watch("alice", "AAPL", 150.0, Direction::Below))
        .await
        .unwrap();
    store
        .add_watch(new_watch("bob", "AAPL", 150.0, Direction::Above))
        .await
        .unwrap();
    store
        .add_watch(new_watch("alice", "AAPL", 151.0, Direction::Above))
        .await
        .unwrap();

    assert_eq!(store.list_active_watches().await.unwrap().len(), 4);
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let store = MemoryWatchStore::new();

    for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = store
            .add_watch(new_watch("alice", "AAPL", price, Direction::Above))
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::Validation(_)), "price {price}");
    }

    let err = store
        .add_watch(new_watch("alice", "   ", 10.0, Direction::Above))
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::Validation(_)));

    let err = store
        .add_watch(new_watch(" ", "AAPL", 10.0, Direction::Above))
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::Validation(_)));

    assert!(store.all_watches().is_empty());
}

#[tokio::test]
async fn removing_someone_elses_watch_is_not_found() {
    let store = MemoryWatchStore::new();
    let w = store
        .add_watch(new_watch("alice", "AAPL", 150.0, Direction::Above))
        .await
        .unwrap();

    let err = store.remove_watch("bob", w.id).await.unwrap_err();
    assert!(matches!(err, WatchError::NotFound(id) if id == w.id));

    let listed = store.list_watches("alice").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].active);
}

#[tokio::test]
async fn removing_twice_or_unknown_id_is_not_found() {
    let store = MemoryWatchStore::new();
    let w = store
        .add_watch(new_watch("alice", "AAPL", 150.0, Direction::Above))
        .await
        .unwrap();

    store.remove_watch("alice", w.id).await.unwrap();
    assert!(matches!(
        store.remove_watch("alice", w.id).await,
        Err(WatchError::NotFound(_))
    ));
    assert!(matches!(
        store.remove_watch("alice", WatchId(999)).await,
        Err(WatchError::NotFound(_))
    ));

    // soft delete: the row is still there for audit
    let all = store.all_watches();
    assert_eq!(all.len(), 1);
    assert!(!all[0].active);
}

#[tokio::test]
async fn record_check_and_alert_update_the_row() {
    let store = MemoryWatchStore::new();
    let w = store
        .add_watch(new_watch("alice", "AAPL", 150.0, Direction::Above))
        .await
        .unwrap();

    store.record_check(w.id, T0 + 5).await.unwrap();
    store.record_alert(w.id, T0 + 5).await.unwrap();
    store.record_alert(w.id, T0 + 7200).await.unwrap();

    let got = &store.list_watches("alice").await.unwrap()[0];
    assert_eq!(got.last_checked_at, Some(T0 + 5));
    assert_eq!(got.last_alerted_at, Some(T0 + 7200));
    assert_eq!(got.alert_count, 2);
}

#[tokio::test]
async fn concurrent_alerts_are_not_lost() {
    let store = Arc::new(MemoryWatchStore::new());
    let w = store
        .add_watch(new_watch("alice", "AAPL", 150.0, Direction::Above))
        .await
        .unwrap();

    let id = w.id;
    let mut handles = Vec::new();
    for i in 0..50 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.record_alert(id, T0 + i).await.unwrap();
            store.record_check(id, T0 + i).await.unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let got = &store.list_watches("alice").await.unwrap()[0];
    assert_eq!(got.alert_count, 50);
}

#[tokio::test]
async fn check_after_remove_does_not_resurrect() {
    let store = MemoryWatchStore::new();
    let w = store
        .add_watch(new_watch("alice", "AAPL", 150.0, Direction::Above))
        .await
        .unwrap();

    store.remove_watch("alice", w.id).await.unwrap();
    store.record_check(w.id, T0 + 1).await.unwrap();
    store.record_alert(w.id, T0 + 1).await.unwrap();

    assert!(store.list_watches("alice").await.unwrap().is_empty());
    assert!(store.list_active_watches().await.unwrap().is_empty());
}

#[tokio::test]
async fn statistics_count_active_watches_only() {
    let store = MemoryWatchStore::new();
    let a = store
        .add_watch(new_watch("alice", "AAPL", 150.0, Direction::Above))
        .await
        .unwrap();
    let b = store
        .add_watch(new_watch("bob", "MSFT", 300.0, Direction::Below))
        .await
        .unwrap();
    let c = store
        .add_watch(new_watch("carol", "TSLA", 200.0, Direction::Above))
        .await
        .unwrap();

    // T0 is 2023-11-14 22:13:20 UTC
    let yesterday = T0 - 86_400;
    store.record_alert(a.id, yesterday).await.unwrap();
    store.record_alert(a.id, T0).await.unwrap();
    store.record_alert(b.id, yesterday).await.unwrap();
    store.record_alert(c.id, T0).await.unwrap();
    store.remove_watch("carol", c.id).await.unwrap();

    let stats = store.statistics(T0 + 60).await.unwrap();
    assert_eq!(stats.active_watch_count, 2);
    assert_eq!(stats.alerts_sent_today, 1);
    assert_eq!(stats.alerts_sent_total, 3);
}

#[tokio::test]
async fn recent_prices_are_newest_first_and_limited() {
    let store = MemoryWatchStore::new();
    for (i, price) in [10.0, 11.0, 12.0, 13.0].into_iter().enumerate() {
        store
            .append_price_sample(PriceSample {
                symbol: "0005.HK".into(),
                price,
                volume: Some(100),
                observed_at: T0 + i as i64,
            })
            .await
            .unwrap();
    }
    store
        .append_price_sample(PriceSample {
            symbol: "AAPL".into(),
            price: 190.0,
            volume: None,
            observed_at: T0 + 10,
        })
        .await
        .unwrap();

    let got = store.recent_prices("5.hk", 3).await.unwrap();
    let prices: Vec<f64> = got.iter().map(|s| s.price).collect();
    assert_eq!(prices, vec![13.0, 12.0, 11.0]);
    assert_eq!(store.sample_count(), 5);
}
