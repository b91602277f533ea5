use goldmaster::domain::entities::database::{AppDatabase, DB_KEY};
use goldmaster::domain::entities::signal::{SignalDirection, SignalLevels, TradeSignal, DEFAULT_PAIR};
use goldmaster::domain::entities::user::{AuthProvider, Role, User};
use goldmaster::persistence::repository::{SessionRepository, SignalRepository};
use goldmaster::persistence::{init_store, StoreError};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;

fn scratch_dir(tag: &str) -> PathBuf {
    let suffix: u64 = rand::thread_rng().gen();
    std::env::temp_dir().join(format!("goldmaster-{}-{:x}", tag, suffix))
}

fn sell_signal(entry: f64) -> TradeSignal {
    TradeSignal::new(
        DEFAULT_PAIR,
        SignalLevels {
            direction: SignalDirection::Sell,
            entry,
            sl: entry + 7.0,
            tp1: entry - 10.0,
            tp2: entry - 20.0,
        },
        87.0,
        false,
        Some("Lower high on H4".to_string()),
    )
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = scratch_dir("restart");

    let store = init_store(&dir).unwrap();
    let signals = SignalRepository::new(store.clone());
    let session = SessionRepository::new(store);

    let seeded = signals.list_signals().unwrap();
    assert_eq!(seeded.len(), 2);
    assert!(seeded.iter().all(|s| s.probability == 85.0));
    assert_eq!(signals.list_ticker().unwrap().len(), 2);

    let published = sell_signal(2050.0);
    signals.add_signal(published.clone()).unwrap();
    signals.push_ticker("CPI beat, gold dips").unwrap();
    session
        .set_user(Some(User {
            id: "admin_001".into(),
            name: "Gold Master Owner".into(),
            email: "admin@goldmaster.com".into(),
            avatar: None,
            is_vip: true,
            role: Role::Admin,
            provider: AuthProvider::Email,
            balance: 1_000_000.0,
        }))
        .unwrap();

    // Reopen from disk
    let store = init_store(&dir).unwrap();
    let signals = SignalRepository::new(store.clone());
    let session = SessionRepository::new(store);

    let reloaded = signals.list_signals().unwrap();
    assert_eq!(reloaded.len(), 3);
    assert_eq!(reloaded[0], published);
    assert_eq!(signals.list_ticker().unwrap()[0], "CPI beat, gold dips");
    assert!(session.current_user().unwrap().unwrap().is_admin());

    let raw = std::fs::read_to_string(dir.join(format!("{}.json", DB_KEY))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(value["tickerMessages"].is_array());
    assert_eq!(value["signals"][0]["type"], "SELL");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_concurrent_publishers_keep_every_signal() {
    let dir = scratch_dir("concurrent");
    let store = init_store(&dir).unwrap();
    let signals = SignalRepository::new(store);

    let mut handles = Vec::new();
    for i in 0..20 {
        let signals = signals.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            signals.add_signal(sell_signal(2000.0 + i as f64)).unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(signals.list_signals().unwrap().len(), 22);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_cap_after_many_publishes() {
    let dir = scratch_dir("cap");
    let store = init_store(&dir).unwrap();
    let signals = SignalRepository::new(store);

    let mut last_id = String::new();
    for i in 0..60 {
        let signal = sell_signal(2000.0 + i as f64);
        last_id = signal.id.clone();
        signals.add_signal(signal).unwrap();
    }

    let list = signals.list_signals().unwrap();
    assert_eq!(list.len(), 50);
    assert_eq!(list[0].id, last_id);
    assert_eq!(list[49].entry, 2010.0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_corrupt_document_is_not_overwritten() {
    let dir = scratch_dir("corrupt");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.json", DB_KEY));
    std::fs::write(&path, "{ not json").unwrap();

    match init_store(&dir) {
        Err(StoreError::Corrupt { key, .. }) => assert_eq!(key, DB_KEY),
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("corrupt document was accepted"),
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_partial_document_takes_defaults() {
    let dir = scratch_dir("partial");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(format!("{}.json", DB_KEY)),
        r#"{"tickerMessages":["only ticker"]}"#,
    )
    .unwrap();

    let store = init_store(&dir).unwrap();
    let db: AppDatabase = store.load().unwrap();
    assert!(db.signals.is_empty());
    assert_eq!(db.ticker_messages, vec!["only ticker".to_string()]);
    assert!(db.settings.notifications);

    let session = SessionRepository::new(Arc::clone(&store));
    assert!(session.current_user().unwrap().is_none());
    let _ = std::fs::remove_dir_all(&dir);
}
