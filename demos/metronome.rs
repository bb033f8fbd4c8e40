//! # Demo: metronome
//!
//! Two tickers feed one clock source: a fast one during the fast phase and a
//! slow one during the slow phase. Phases alternate every 15 fast periods.
//!
//! ```text
//! Ticker "fast" (1p) ──gate: fast phase──┐
//!                                        ├──► Source "clock" ──► printer
//! Ticker "slow" (3p) ──gate: slow phase──┘
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example metronome
//! ```

use std::sync::Arc;
use std::time::Duration;

use rillflow::{ListenerFn, LogWriter, Source, Ticker};
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const PERIOD: Duration = Duration::from_millis(100);
const PHASE: Duration = Duration::from_millis(1500);
const CYCLES: u32 = 2;

#[derive(Debug)]
struct Tick {
    pace: &'static str,
    n: u64,
    at: Duration,
}

fn slow_phase(start: Instant) -> bool {
    let cycle = PHASE.as_millis() * 2;
    start.elapsed().as_millis() % cycle >= PHASE.as_millis()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let start = Instant::now();
    let clock: Source<Tick> = Source::<Tick>::builder("clock").without_history().build();
    let _log = LogWriter::new().attach(clock.bus());

    let sub = clock.subscribe(
        ListenerFn::new("printer", |tick: Arc<Tick>| async move {
            tracing::info!(pace = tick.pace, n = tick.n, at_ms = tick.at.as_millis() as u64, "[clock]");
        })
        .into_ref(),
    );

    let stop = CancellationToken::new();
    let fast = Ticker::new("fast", PERIOD)
        .with_token(stop.child_token())
        .gate(move || !slow_phase(start))
        .spawn(clock.clone(), move |n| Tick {
            pace: "fast",
            n,
            at: start.elapsed(),
        });
    let slow = Ticker::new("slow", PERIOD * 3)
        .with_token(stop.child_token())
        .gate(move || slow_phase(start))
        .spawn(clock.clone(), move |n| Tick {
            pace: "slow",
            n,
            at: start.elapsed(),
        });

    sleep(PHASE * 2 * CYCLES).await;
    stop.cancel();
    let (fast, slow) = (fast.join().await, slow.join().await);
    clock.complete();
    sub.settled().await;

    tracing::info!(%fast, %slow, "[metronome] stopped");
    Ok(())
}
