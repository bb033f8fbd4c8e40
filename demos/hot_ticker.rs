//! # Demo: hot_ticker
//!
//! A periodic source is published and connected once; listeners come and go
//! while it keeps ticking.
//!
//! ## Timeline
//! ```text
//! t=0      subscriber-1 attaches, connect(), ticker starts
//! t=5p     subscriber-2 attaches (sees only ticks from now on)
//! t=10p    subscriber-1 disposed
//! t=15p    subscriber-1 attaches again
//! t=20p    ticker stopped, source completed
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example hot_ticker
//! ```

use std::sync::Arc;
use std::time::Duration;

use rillflow::{ListenerFn, ListenerRef, LogWriter, Source, Ticker};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const PERIOD: Duration = Duration::from_millis(200);

fn printer(name: &'static str) -> ListenerRef<u64> {
    ListenerFn::new(name, move |tick: Arc<u64>| async move {
        tracing::info!(listener = name, tick = *tick, "[tick]");
    })
    .on_complete(move || tracing::info!(listener = name, "[done]"))
    .into_ref()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let interval: Source<u64> = Source::<u64>::builder("interval").without_history().build();
    let _log = LogWriter::new().attach(interval.bus());

    let hot = interval.publish();
    let first = hot.subscribe(printer("subscriber-1"));
    hot.connect();
    let ticker = Ticker::new("interval", PERIOD).spawn(interval.clone(), |n| n);

    sleep(PERIOD * 5).await;
    let second = hot.subscribe(printer("subscriber-2"));

    sleep(PERIOD * 5).await;
    first.dispose();

    sleep(PERIOD * 5).await;
    let again = hot.subscribe(printer("subscriber-1"));

    sleep(PERIOD * 5).await;
    ticker.stop();
    let exit = ticker.join().await;
    interval.complete();

    second.settled().await;
    again.settled().await;
    tracing::info!(%exit, "[hot-ticker] finished");
    Ok(())
}
