//! # Demo: async_emitter
//!
//! A cold source whose producer runs on a background task, once per subscriber.
//!
//! Shows how to:
//! - Write a producer that checks [`Emitter::is_disposed`] before every emission.
//! - Stop a run early by disposing its subscription.
//! - Complete once, after the loop.
//!
//! ## Flow
//! ```text
//! subscribe(reader)  ──► run #1: Value #1 .. Value #20, complete
//! subscribe(quitter) ──► run #2: Value #1 .. Value #5, disposed → producer returns
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example async_emitter
//! ```

use std::sync::Arc;
use std::time::Duration;

use rillflow::{ColdSource, Emitter, ListenerFn, ListenerRef, LogWriter};
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const TICK: Duration = Duration::from_millis(100);
const COUNT: u32 = 20;

fn printer(name: &'static str, done: Arc<Notify>) -> ListenerRef<String> {
    ListenerFn::new(name, move |value: Arc<String>| async move {
        tracing::info!(listener = name, %value, "[received]");
    })
    .on_complete(move || done.notify_one())
    .into_ref()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let values = ColdSource::new("values", |em: Emitter<String>| async move {
        for i in 1..=COUNT {
            if em.is_disposed() {
                tracing::info!(next = i, "[producer] nobody listening, stopping");
                return;
            }
            em.emit(format!("Value #{i}"));
            tokio::select! {
                _ = em.cancelled() => continue,
                _ = sleep(TICK) => {}
            }
        }
        em.complete();
    });
    let _log = LogWriter::new().attach(values.bus());

    let finished = Arc::new(Notify::new());
    let reader = values.subscribe(printer("reader", Arc::clone(&finished)));
    let quitter = values.subscribe(printer("quitter", Arc::new(Notify::new())));

    sleep(TICK * 5 - TICK / 2).await;
    quitter.dispose();

    finished.notified().await;
    reader.settled().await;
    tracing::info!("[async-emitter] reader saw every value");
    Ok(())
}
