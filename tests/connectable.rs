mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{Recorder, WAIT};
use rillflow::{BackpressurePolicy, ColdSource, Emitter, EventKind, Source, Ticker, TickerExit};
use tokio::sync::Notify;
use tokio::time::timeout;

#[tokio::test]
async fn nothing_flows_before_connect() {
    let upstream: Source<u32> = Source::new("feed");
    let hot = upstream.publish();
    let early = Recorder::new("early");
    let _a = hot.subscribe(early.listener());

    upstream.emit(1);
    assert!(hot.connect());
    let late = Recorder::new("late");
    let _b = hot.subscribe(late.listener());

    upstream.emit(2);
    upstream.emit(3);
    upstream.complete();

    early.finished().await;
    late.finished().await;
    assert_eq!(early.items(), vec![2, 3]);
    assert_eq!(late.items(), vec![2, 3]);
    assert_eq!(early.completed(), 1);
    assert_eq!(late.completed(), 1);
}

#[tokio::test]
async fn connecting_twice_changes_nothing() {
    let upstream: Source<u32> = Source::new("feed");
    let hot = upstream.publish();
    let rec = Recorder::new("only");
    let _sub = hot.subscribe(rec.listener());
    let mut events = upstream.bus().subscribe();

    assert!(hot.connect());
    assert!(!hot.connect());
    assert_eq!(upstream.subscriber_count(), 1);

    upstream.emit(9);
    upstream.complete();
    rec.finished().await;
    assert_eq!(rec.items(), vec![9]);

    let connected = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|ev| ev.kind == EventKind::Connected)
        .count();
    assert_eq!(connected, 1);
}

#[tokio::test]
async fn hot_listeners_keep_their_own_policy() {
    let upstream: Source<u32> = Source::new("feed");
    let hot = upstream.publish();
    let slow = Recorder::blocking_on("slow", 1);
    let fast = Recorder::new("fast");
    let _s = hot.subscribe_with(slow.listener(), BackpressurePolicy::Latest);
    let _f = hot.subscribe(fast.listener());
    hot.connect();

    upstream.emit(1);
    slow.started().await;
    for i in 2..=4 {
        upstream.emit(i);
    }
    slow.release();
    upstream.complete();

    slow.finished().await;
    fast.finished().await;
    assert_eq!(slow.items(), vec![1, 4]);
    assert_eq!(fast.items(), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn resubscribing_to_a_connected_source() {
    let upstream: Source<u32> = Source::new("feed");
    let hot = upstream.publish();
    hot.connect();

    let first = Recorder::new("first");
    let sub = hot.subscribe(first.listener());
    upstream.emit(1);
    sub.settled().await;
    sub.dispose();
    upstream.emit(2);

    let again = Recorder::new("again");
    let _again = hot.subscribe(again.listener());
    upstream.emit(3);
    upstream.complete();

    again.finished().await;
    assert_eq!(first.items(), vec![1]);
    assert_eq!(again.items(), vec![3]);
}

#[tokio::test]
async fn cold_source_runs_once_per_subscriber() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let cold = ColdSource::new("count", move |em: Emitter<u32>| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            for i in 1..=3 {
                em.emit(i);
            }
            em.complete();
        }
    });

    let a = Recorder::new("a");
    let b = Recorder::new("b");
    let _sa = cold.subscribe(a.listener());
    a.finished().await;
    let _sb = cold.subscribe(b.listener());
    b.finished().await;

    assert_eq!(a.items(), vec![1, 2, 3]);
    assert_eq!(b.items(), vec![1, 2, 3]);
    assert_eq!(a.completed(), 1);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cold_producer_stops_after_dispose() {
    let stopped = Arc::new(Notify::new());
    let flag = Arc::clone(&stopped);
    let cold = ColdSource::new("endless", move |em: Emitter<u32>| {
        let flag = Arc::clone(&flag);
        async move {
            let mut i = 0;
            while !em.is_disposed() {
                em.emit(i);
                i += 1;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            flag.notify_one();
        }
    });

    let rec = Recorder::new("reader");
    let sub = cold.subscribe(rec.listener());
    tokio::time::sleep(Duration::from_millis(30)).await;
    sub.dispose();

    timeout(WAIT, stopped.notified())
        .await
        .expect("producer kept running");
    let seen = rec.items();
    assert!(!seen.is_empty());
    assert_eq!(seen, (0..seen.len() as u32).collect::<Vec<_>>());
}

#[tokio::test]
async fn published_cold_source_shares_one_run() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let cold = ColdSource::new("shared", move |em: Emitter<u32>| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            for i in 1..=3 {
                em.emit(i);
            }
            em.complete();
        }
    });

    let hot = cold.publish();
    let a = Recorder::new("a");
    let b = Recorder::new("b");
    let _sa = hot.subscribe(a.listener());
    let _sb = hot.subscribe(b.listener());
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    hot.connect();
    hot.connect();
    a.finished().await;
    b.finished().await;

    assert_eq!(a.items(), vec![1, 2, 3]);
    assert_eq!(b.items(), vec![1, 2, 3]);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn published_cold_producer_stops_when_last_listener_leaves() {
    let stopped = Arc::new(Notify::new());
    let flag = Arc::clone(&stopped);
    let cold = ColdSource::new("endless", move |em: Emitter<u32>| {
        let flag = Arc::clone(&flag);
        async move {
            let mut i = 0;
            while !em.is_disposed() {
                em.emit(i);
                i += 1;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            flag.notify_one();
        }
    });

    let hot = cold.publish();
    let rec = Recorder::new("reader");
    let sub = hot.subscribe(rec.listener());
    hot.connect();
    tokio::time::sleep(Duration::from_millis(30)).await;
    sub.dispose();

    timeout(WAIT, stopped.notified())
        .await
        .expect("shared producer kept running");
    assert!(!rec.items().is_empty());
}

#[tokio::test(start_paused = true)]
async fn ticker_stops_when_hot_listeners_leave() {
    let interval: Source<u32> = Source::new("interval");
    let hot = interval.publish();
    let rec = Recorder::new("ticks");
    let sub = hot.subscribe(rec.listener());
    hot.connect();

    let handle =
        Ticker::new("interval", Duration::from_secs(1)).spawn(interval.clone(), |n| n as u32);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    sub.dispose();

    assert_eq!(handle.join().await, TickerExit::Unobserved);
    assert_eq!(interval.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn ticker_feeds_a_connected_source() {
    let interval: Source<u32> = Source::new("interval");
    let hot = interval.publish();
    let rec = Recorder::new("ticks");
    let _sub = hot.subscribe(rec.listener());
    hot.connect();

    let handle = Ticker::new("interval", Duration::from_secs(1))
        .with_limit(5)
        .complete_on_exhaust(true)
        .spawn(interval.clone(), |n| n as u32);

    assert_eq!(handle.join().await, TickerExit::Exhausted);
    rec.finished().await;
    assert_eq!(rec.items(), vec![0, 1, 2, 3, 4]);
    assert_eq!(rec.completed(), 1);
}
