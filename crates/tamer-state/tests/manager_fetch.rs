//! Load-and-cache behaviour of the pet inventory manager

use std::sync::Arc;
use std::time::Duration;
use tamer_state::{Cancellation, InventoryError, ManagerConfig, PetInventory, PetInventoryManager};
use tamer_test_utils::{fragment_packets, init_test_logging, pet, RecordingSender};

fn setup() -> (Arc<PetInventoryManager>, RecordingSender) {
    init_test_logging();
    let sender = RecordingSender::new();
    let manager = Arc::new(PetInventoryManager::new(
        Arc::new(sender.clone()),
        ManagerConfig::default(),
    ));
    (manager, sender)
}

fn deliver_listing(manager: &PetInventoryManager, ids: &[i64], chunk: usize) {
    let pets: Vec<_> = ids.iter().map(|&id| pet(id, "Pet", 1)).collect();
    for mut packet in fragment_packets(&manager.config().headers, &pets, chunk) {
        manager.dispatch(&mut packet);
    }
}

#[tokio::test]
async fn concurrent_callers_share_one_request() {
    let (manager, sender) = setup();
    let request = manager.config().headers.get_pet_inventory;

    let first = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.get_inventory(Duration::from_secs(5), Cancellation::never()).await }
    });
    let second = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.get_inventory(Duration::from_secs(5), Cancellation::never()).await }
    });

    sender.wait_for_sends(1).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(manager.is_loading());

    deliver_listing(&manager, &[1, 2, 3, 4, 5], 2);

    let first = first.await.unwrap().expect("first caller resolves");
    let second = second.await.unwrap().expect("second caller resolves");

    assert!(PetInventory::ptr_eq(&first, &second));
    assert_eq!(first.len(), 5);
    assert_eq!(sender.count(request).await, 1);
    assert!(!manager.is_loading());
}

#[tokio::test]
async fn valid_inventory_returns_without_request() {
    let (manager, sender) = setup();

    let waiter = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.fetch().await }
    });
    sender.wait_for_sends(1).await;
    deliver_listing(&manager, &[10], 100);
    let loaded = waiter.await.unwrap().unwrap();

    let again = manager
        .get_inventory(Duration::from_millis(1), Cancellation::never())
        .await
        .expect("fast path");
    assert!(PetInventory::ptr_eq(&loaded, &again));
    assert_eq!(sender.sent().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_does_not_send_a_second_request() {
    let (manager, sender) = setup();
    let request = manager.config().headers.get_pet_inventory;

    let result = manager
        .get_inventory(Duration::from_millis(50), Cancellation::never())
        .await;
    assert_eq!(result.unwrap_err(), InventoryError::TimedOut);
    assert!(manager.is_loading());

    // Still in flight: piggyback rather than resend
    let result = manager
        .get_inventory(Duration::from_millis(50), Cancellation::never())
        .await;
    assert_eq!(result.unwrap_err(), InventoryError::TimedOut);
    assert_eq!(sender.count(request).await, 1);
}

#[tokio::test(start_paused = true)]
async fn timed_out_caller_leaves_others_waiting() {
    let (manager, sender) = setup();

    let patient = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.get_inventory(Duration::ZERO, Cancellation::never()).await }
    });
    sender.wait_for_sends(1).await;

    let hasty = manager
        .get_inventory(Duration::from_millis(50), Cancellation::never())
        .await;
    assert_eq!(hasty.unwrap_err(), InventoryError::TimedOut);

    deliver_listing(&manager, &[7, 8], 1);
    let inventory = patient.await.unwrap().expect("patient caller resolves");
    assert_eq!(inventory.len(), 2);
}

#[tokio::test]
async fn cancellation_ends_only_that_wait() {
    let (manager, sender) = setup();
    let (handle, cancel) = Cancellation::new();

    let cancelled = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.get_inventory(Duration::ZERO, cancel).await }
    });
    let other = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.get_inventory(Duration::from_secs(5), Cancellation::never()).await }
    });

    sender.wait_for_sends(1).await;
    handle.cancel();
    assert_eq!(
        cancelled.await.unwrap().unwrap_err(),
        InventoryError::Cancelled
    );

    deliver_listing(&manager, &[1], 10);
    assert_eq!(other.await.unwrap().unwrap().len(), 1);
    assert_eq!(sender.sent().await.len(), 1);
}

#[tokio::test]
async fn failed_send_clears_in_flight() {
    let (manager, sender) = setup();
    sender.set_failing(true);

    let result = manager
        .get_inventory(Duration::from_secs(1), Cancellation::never())
        .await;
    assert!(matches!(result, Err(InventoryError::Send(_))));
    assert!(!manager.is_loading());

    sender.set_failing(false);
    let waiter = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.fetch().await }
    });
    sender.wait_for_sends(1).await;
    deliver_listing(&manager, &[3], 10);
    assert!(waiter.await.unwrap().is_ok());
}

#[tokio::test]
async fn disconnect_behaves_like_first_use() {
    let (manager, sender) = setup();
    let request = manager.config().headers.get_pet_inventory;

    let waiter = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.fetch().await }
    });
    sender.wait_for_sends(1).await;
    deliver_listing(&manager, &[1, 2], 10);
    let before = waiter.await.unwrap().unwrap();

    manager.on_disconnected();
    assert!(manager.inventory().is_none());
    assert!(!manager.is_loading());

    let waiter = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.fetch().await }
    });
    sender.wait_for_sends(2).await;
    assert_eq!(sender.count(request).await, 2);

    deliver_listing(&manager, &[3], 10);
    let after = waiter.await.unwrap().unwrap();

    assert!(!PetInventory::ptr_eq(&before, &after));
    assert_eq!(after.ids(), vec![3]);
}

#[tokio::test]
async fn invalidated_inventory_is_refetched() {
    let (manager, sender) = setup();

    let waiter = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.fetch().await }
    });
    sender.wait_for_sends(1).await;
    deliver_listing(&manager, &[1], 10);
    let loaded = waiter.await.unwrap().unwrap();

    manager.invalidate();
    assert!(loaded.is_invalidated());
    // Stale copy is still readable
    assert!(loaded.contains(1));

    let waiter = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.fetch().await }
    });
    sender.wait_for_sends(2).await;
    deliver_listing(&manager, &[2], 10);
    let reloaded = waiter.await.unwrap().unwrap();

    assert!(PetInventory::ptr_eq(&loaded, &reloaded));
    assert!(!reloaded.is_invalidated());
    assert_eq!(reloaded.ids(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn abandoned_request_is_sent_again() {
    let (manager, sender) = setup();
    let request = manager.config().headers.get_pet_inventory;
    sender.set_delay(Duration::from_millis(100));

    // Dropped by the outer timeout while the send is still in progress
    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        manager.get_inventory(Duration::ZERO, Cancellation::never()),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(!manager.is_loading());
    assert_eq!(sender.count(request).await, 0);

    sender.set_delay(Duration::ZERO);
    let waiter = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.get_inventory(Duration::from_millis(500), Cancellation::never()).await }
    });
    sender.wait_for_sends(1).await;
    deliver_listing(&manager, &[4], 10);

    assert_eq!(waiter.await.unwrap().unwrap().ids(), vec![4]);
    assert_eq!(sender.count(request).await, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_send_does_not_delay_timeout_or_cancellation() {
    let (manager, sender) = setup();
    sender.set_delay(Duration::from_millis(100));

    let started = tokio::time::Instant::now();
    let result = manager
        .get_inventory(Duration::from_millis(5), Cancellation::never())
        .await;
    assert_eq!(result.unwrap_err(), InventoryError::TimedOut);
    assert!(started.elapsed() < Duration::from_millis(100));
    assert!(!manager.is_loading());

    let (handle, cancel) = Cancellation::new();
    handle.cancel();
    let started = tokio::time::Instant::now();
    let result = manager.get_inventory(Duration::from_millis(5), cancel).await;
    assert_eq!(result.unwrap_err(), InventoryError::Cancelled);
    assert!(started.elapsed() < Duration::from_millis(5));

    let (handle, cancel) = Cancellation::new();
    let pending = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.get_inventory(Duration::ZERO, cancel).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(manager.is_loading());

    handle.cancel();
    assert_eq!(
        pending.await.unwrap().unwrap_err(),
        InventoryError::Cancelled
    );
    assert!(!manager.is_loading());
    assert!(sender.sent().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn caller_racing_an_unsolicited_listing_resolves() {
    for _ in 0..200 {
        let (manager, _sender) = setup();

        let caller = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.get_inventory(Duration::from_secs(5), Cancellation::never()).await }
        });
        tokio::task::spawn_blocking({
            let manager = Arc::clone(&manager);
            move || deliver_listing(&manager, &[1], 10)
        })
        .await
        .unwrap();

        let inventory = tokio::time::timeout(Duration::from_secs(1), caller)
            .await
            .expect("caller is not left waiting on a second request")
            .unwrap()
            .expect("inventory");
        assert_eq!(inventory.ids(), vec![1]);
    }
}
