//! Fan-out hub delivery guarantees.

use std::time::Duration;

use bustrack::services::BroadcastHub;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_millis(100);

#[tokio::test]
async fn test_unsubscribed_handle_receives_nothing() {
    let hub: BroadcastHub<String> = BroadcastHub::new();
    let sub = hub.subscribe();

    hub.unsubscribe(sub.id());
    hub.publish("after".to_string());

    let received = timeout(WAIT, sub.recv()).await.expect("recv should resolve once closed");
    assert_eq!(received, None);
}

#[tokio::test]
async fn test_unsubscribe_discards_queued_events() {
    let hub: BroadcastHub<u32> = BroadcastHub::new();
    let sub = hub.subscribe();
    hub.publish(1);
    hub.publish(2);

    hub.unsubscribe(sub.id());
    assert_eq!(sub.try_recv(), None);
}

#[tokio::test]
async fn test_per_subscriber_fifo() {
    let hub: BroadcastHub<u32> = BroadcastHub::with_capacity(1024);
    let a = hub.subscribe();
    let b = hub.subscribe();

    for i in 0..100 {
        hub.publish(i);
    }

    for sub in [&a, &b] {
        for expected in 0..100 {
            let got = timeout(WAIT, sub.recv()).await.unwrap();
            assert_eq!(got, Some(expected));
        }
    }
}

#[tokio::test]
async fn test_recv_wakes_on_publish_from_other_task() {
    let hub: BroadcastHub<&'static str> = BroadcastHub::new();
    let sub = hub.subscribe();

    let publisher = hub.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        publisher.publish("bus moved");
    });

    let got = timeout(Duration::from_secs(1), sub.recv()).await.unwrap();
    assert_eq!(got, Some("bus moved"));
}

#[tokio::test]
async fn test_slow_subscriber_never_blocks_publisher() {
    let hub: BroadcastHub<u64> = BroadcastHub::with_capacity(8);
    let stalled = hub.subscribe();
    let reader = hub.subscribe();

    let publisher = {
        let hub = hub.clone();
        tokio::task::spawn_blocking(move || {
            for i in 0..10_000u64 {
                hub.publish(i);
            }
        })
    };
    timeout(Duration::from_secs(5), publisher)
        .await
        .expect("publisher stalled")
        .unwrap();

    // The stalled subscriber kept only the newest events.
    let kept: Vec<u64> = std::iter::from_fn(|| stalled.try_recv()).collect();
    assert_eq!(kept, (9_992..10_000).collect::<Vec<_>>());
    assert_eq!(stalled.dropped(), 9_992);

    assert_eq!(reader.try_recv(), Some(9_992));
}

#[tokio::test]
async fn test_notify_reaches_only_bound_subscriber() {
    let hub: BroadcastHub<String> = BroadcastHub::new();
    let driver = hub.subscribe();
    let passenger = hub.subscribe();
    hub.register_target("driver-42", driver.id());

    assert!(hub.notify("driver-42", "passenger waiting".to_string()));
    assert_eq!(driver.try_recv().as_deref(), Some("passenger waiting"));
    assert_eq!(passenger.try_recv(), None);
}

#[tokio::test]
async fn test_notify_unknown_target_is_silently_dropped() {
    let hub: BroadcastHub<String> = BroadcastHub::new();
    let sub = hub.subscribe();
    assert!(!hub.notify("nobody", "hello".to_string()));
    assert_eq!(sub.try_recv(), None);
}

#[tokio::test]
async fn test_notify_after_target_unsubscribed_is_dropped() {
    let hub: BroadcastHub<String> = BroadcastHub::new();
    let driver = hub.subscribe();
    hub.register_target("driver-42", driver.id());
    hub.unsubscribe(driver.id());

    assert!(!hub.notify("driver-42", "late".to_string()));
    assert_eq!(hub.target_count(), 0);
}

#[tokio::test]
async fn test_concurrent_publishers_deliver_everything() {
    let hub: BroadcastHub<(usize, usize)> = BroadcastHub::with_capacity(10_000);
    let sub = hub.subscribe();

    let tasks: Vec<_> = (0..8)
        .map(|source| {
            let hub = hub.clone();
            tokio::spawn(async move {
                for seq in 0..250 {
                    hub.publish((source, seq));
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let mut last_seq = vec![None; 8];
    let mut total = 0;
    while let Some((source, seq)) = sub.try_recv() {
        // Events from one source arrive in publish order.
        if let Some(prev) = last_seq[source] {
            assert!(seq > prev);
        }
        last_seq[source] = Some(seq);
        total += 1;
    }
    assert_eq!(total, 2000);
}
