//! # Demo: contacts_book
//!
//! An address book pushes every new [`Person`] to its listeners.
//!
//! Shows how to:
//! - Own a [`Source`] inside a domain type and expose `add` / `close`.
//! - Attach a slow listener with [`BackpressurePolicy::DropNew`] next to a fast one.
//! - Convert the book into a hot view with [`Source::publish`] and `connect()`.
//!
//! ## Flow
//! ```text
//! ContactsBook::add(person) ──► Source::emit
//!     ├─► Mailbox(DropNew) ──► SlowReader   (sleeps per person, misses most of them)
//!     ├─► Mailbox(Unbounded) ──► Printer    (sees every person)
//!     └─► Relay (after connect) ──► contacts.hot ──► Counter
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example contacts_book
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rillflow::{BackpressurePolicy, Listener, LogWriter, Source, StreamError};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct Person {
    firstname: String,
    lastname: String,
    age: u32,
}

impl Person {
    fn new(firstname: &str, lastname: &str, age: u32) -> Self {
        Self {
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            age,
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.firstname, self.lastname, self.age)
    }
}

/// Address book that announces new contacts.
struct ContactsBook {
    people: Source<Person>,
}

impl ContactsBook {
    fn new() -> Self {
        Self {
            people: Source::new("contacts"),
        }
    }

    fn add(&self, person: Person) {
        self.people.emit(person);
    }

    fn close(&self) {
        self.people.complete();
    }

    fn source(&self) -> &Source<Person> {
        &self.people
    }
}

/// Simulates expensive per-contact processing.
struct SlowReader {
    delay: Duration,
    seen: AtomicUsize,
}

#[async_trait]
impl Listener<Person> for SlowReader {
    async fn on_data_ready(&self, person: Arc<Person>) {
        tokio::time::sleep(self.delay).await;
        self.seen.fetch_add(1, Ordering::Relaxed);
        tracing::info!(%person, "[slow-reader] processed");
    }

    async fn on_data_complete(&self) {
        tracing::info!(
            seen = self.seen.load(Ordering::Relaxed),
            "[slow-reader] book closed"
        );
    }

    async fn on_data_error(&self, error: &StreamError) {
        tracing::error!(%error, "[slow-reader] stream failed");
    }

    fn name(&self) -> &'static str {
        "slow-reader"
    }
}

struct Printer;

#[async_trait]
impl Listener<Person> for Printer {
    async fn on_data_ready(&self, person: Arc<Person>) {
        tracing::debug!(%person, "[printer]");
    }

    fn name(&self) -> &'static str {
        "printer"
    }
}

#[derive(Default)]
struct Counter {
    count: AtomicUsize,
}

#[async_trait]
impl Listener<Person> for Counter {
    async fn on_data_ready(&self, _person: Arc<Person>) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    async fn on_data_complete(&self) {
        tracing::info!(
            count = self.count.load(Ordering::Relaxed),
            "[counter] people seen through the hot view"
        );
    }

    fn name(&self) -> &'static str {
        "counter"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let book = ContactsBook::new();
    let _log = LogWriter::new().attach(book.source().bus());

    // Nobody listens yet: these two are only recorded in the history.
    book.add(Person::new("Ada", "Lovelace", 17));
    book.add(Person::new("Ada", "Lovelace", 18));

    let slow = book.source().subscribe_with(
        Arc::new(SlowReader {
            delay: Duration::from_millis(300),
            seen: AtomicUsize::new(0),
        }),
        BackpressurePolicy::DropNew,
    );
    let printer = book.source().subscribe(Arc::new(Printer));

    let hot = book.source().publish();
    let counter = hot.subscribe(Arc::new(Counter::default()));
    hot.connect();

    for age in 23..27 {
        book.add(Person::new("Grace", "Hopper", age));
    }
    for i in 0..500 {
        book.add(Person::new("Alan", "Turing", 30 + i));
    }
    book.close();

    slow.settled().await;
    printer.settled().await;
    counter.settled().await;

    tracing::info!(
        recorded = book.source().history().len(),
        "[contacts] done"
    );
    Ok(())
}
