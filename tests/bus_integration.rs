//! Black-box integration tests against the public `md_bus` API, covering
//! the scenarios a client of the bus (not the bus's own unit tests) would
//! exercise: multi-bus isolation, wildcard + topic coexistence, and repeated
//! subscribe/unsubscribe churn.

use md_bus::{EventBus, Payload, Tick, Topic, make_event};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn tick(symbol: &str) -> md_bus::Event {
    make_event(
        Topic::MdTick,
        Payload::Tick(Tick {
            symbol: symbol.to_string(),
            price: 1.0,
            qty: 1.0,
        }),
    )
}

#[test]
fn two_independent_buses_do_not_cross_deliver() {
    let bus_a = EventBus::new(16, 16);
    let bus_b = EventBus::new(16, 16);

    let count_a = Arc::new(AtomicUsize::new(0));
    let count_b = Arc::new(AtomicUsize::new(0));
    let ca = count_a.clone();
    let cb = count_b.clone();
    bus_a.subscribe(Topic::MdTick, move |_| {
        ca.fetch_add(1, Ordering::SeqCst);
    });
    bus_b.subscribe(Topic::MdTick, move |_| {
        cb.fetch_add(1, Ordering::SeqCst);
    });

    for _ in 0..5 {
        bus_a.publish(tick("X"));
    }
    std::thread::sleep(Duration::from_millis(50));

    assert_eq!(count_a.load(Ordering::SeqCst), 5);
    assert_eq!(count_b.load(Ordering::SeqCst), 0);

    bus_a.stop();
    bus_b.stop();
}

#[test]
fn topic_filtered_subscriber_never_sees_other_topics() {
    let bus = EventBus::new(32, 32);
    let order_count = Arc::new(AtomicUsize::new(0));
    let oc = order_count.clone();
    bus.subscribe(Topic::Order, move |event| {
        assert_eq!(event.header.topic, Topic::Order);
        oc.fetch_add(1, Ordering::SeqCst);
    });

    for i in 0..10 {
        bus.publish(tick(&format!("sym-{i}")));
    }
    std::thread::sleep(Duration::from_millis(50));

    assert_eq!(order_count.load(Ordering::SeqCst), 0);
    bus.stop();
}

#[test]
fn subscribe_unsubscribe_churn_leaves_bus_usable() {
    let bus = EventBus::new(64, 64);
    for _ in 0..50 {
        let id = bus.subscribe(Topic::MdTick, |_| {});
        bus.unsubscribe(id);
    }

    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    bus.subscribe(Topic::MdTick, move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    for _ in 0..20 {
        bus.publish(tick("X"));
    }
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(count.load(Ordering::SeqCst), 20);
    bus.stop();
}

#[test]
fn perf_snapshot_event_count_tracks_published_total() {
    let bus = EventBus::new(128, 128);
    bus.subscribe(Topic::MdTick, |_| {});
    for _ in 0..30 {
        bus.publish(tick("X"));
    }
    std::thread::sleep(Duration::from_millis(80));
    let snap = bus.perf_snapshot();
    assert_eq!(snap.events, 30);
}

#[test]
fn perf_disabled_still_routes_events_but_skips_latency_sampling() {
    let bus = EventBus::new(32, 32);
    bus.set_perf_enabled(false);
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    bus.subscribe(Topic::MdTick, move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    for _ in 0..10 {
        bus.publish(tick("X"));
    }
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(count.load(Ordering::SeqCst), 10);
    bus.stop();
}
