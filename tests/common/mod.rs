#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rillflow::{Listener, ListenerRef, StreamError};
use tokio::sync::Notify;
use tokio::time::timeout;

pub const WAIT: Duration = Duration::from_secs(2);

/// Listener that records everything it receives.
///
/// Optionally blocks inside the callback for one item until [`Recorder::release`],
/// or panics on one item.
pub struct Recorder {
    name: &'static str,
    block_on: Option<u32>,
    panic_on: Option<u32>,
    items: Mutex<Vec<u32>>,
    errors: Mutex<Vec<StreamError>>,
    completed: AtomicUsize,
    started: Notify,
    release: Notify,
    done: Notify,
}

impl Recorder {
    pub fn new(name: &'static str) -> Arc<Self> {
        Self::build(name, None, None)
    }

    pub fn blocking_on(name: &'static str, item: u32) -> Arc<Self> {
        Self::build(name, Some(item), None)
    }

    pub fn panicking_on(name: &'static str, item: u32) -> Arc<Self> {
        Self::build(name, None, Some(item))
    }

    fn build(name: &'static str, block_on: Option<u32>, panic_on: Option<u32>) -> Arc<Self> {
        Arc::new(Self {
            name,
            block_on,
            panic_on,
            items: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
            started: Notify::new(),
            release: Notify::new(),
            done: Notify::new(),
        })
    }

    pub fn listener(self: &Arc<Self>) -> ListenerRef<u32> {
        Arc::clone(self) as ListenerRef<u32>
    }

    pub fn items(&self) -> Vec<u32> {
        self.items.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<StreamError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Waits until the blocking callback has started.
    pub async fn started(&self) {
        timeout(WAIT, self.started.notified())
            .await
            .expect("blocking callback never started");
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    /// Waits for `on_data_complete` or `on_data_error`.
    pub async fn finished(&self) {
        timeout(WAIT, self.done.notified())
            .await
            .expect("listener never finished");
    }
}

#[async_trait]
impl Listener<u32> for Recorder {
    async fn on_data_ready(&self, item: Arc<u32>) {
        if self.panic_on == Some(*item) {
            panic!("recorder {} refuses {}", self.name, item);
        }
        if self.block_on == Some(*item) {
            self.started.notify_one();
            self.release.notified().await;
        }
        self.items.lock().unwrap().push(*item);
    }

    async fn on_data_complete(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.done.notify_one();
    }

    async fn on_data_error(&self, error: &StreamError) {
        self.errors.lock().unwrap().push(error.clone());
        self.done.notify_one();
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
