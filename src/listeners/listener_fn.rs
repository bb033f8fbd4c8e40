//! # Function-backed listener (`ListenerFn`)
//!
//! [`ListenerFn`] wraps a closure `F: Fn(Arc<T>) -> Fut`, producing a fresh future
//! per item. Completion and error hooks are optional synchronous closures.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use rillflow::{ListenerFn, ListenerRef};
//!
//! let printer: ListenerRef<u64> = ListenerFn::new("printer", |tick: Arc<u64>| async move {
//!     println!("tick {tick}");
//! })
//! .on_complete(|| println!("done"))
//! .into_ref();
//!
//! assert_eq!(printer.name(), "printer");
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StreamError;
use crate::listeners::Listener;

/// Shared handle to a listener.
pub type ListenerRef<T> = Arc<dyn Listener<T>>;

type CompleteHook = Box<dyn Fn() + Send + Sync>;
type ErrorHook = Box<dyn Fn(&StreamError) + Send + Sync>;

/// Closure-backed listener implementation.
pub struct ListenerFn<F> {
    name: &'static str,
    f: F,
    on_complete: Option<CompleteHook>,
    on_error: Option<ErrorHook>,
}

impl<F> ListenerFn<F> {
    /// Creates a new function-backed listener.
    pub fn new(name: &'static str, f: F) -> Self {
        Self {
            name,
            f,
            on_complete: None,
            on_error: None,
        }
    }

    /// Creates the listener and returns it as a shared handle.
    pub fn arc(name: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Sets the completion hook.
    pub fn on_complete(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Sets the error hook.
    pub fn on_error(mut self, hook: impl Fn(&StreamError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Finishes building and erases the closure type.
    pub fn into_ref<T, Fut>(self) -> ListenerRef<T>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Arc::new(self)
    }
}

#[async_trait]
impl<T, F, Fut> Listener<T> for ListenerFn<F>
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_data_ready(&self, item: Arc<T>) {
        (self.f)(item).await;
    }

    async fn on_data_complete(&self) {
        if let Some(hook) = &self.on_complete {
            hook();
        }
    }

    async fn on_data_error(&self, error: &StreamError) {
        if let Some(hook) = &self.on_error {
            hook(error);
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn forwards_items_and_hooks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let done = Arc::new(AtomicBool::new(false));
        let failed = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        let done_flag = Arc::clone(&done);
        let failure = Arc::clone(&failed);
        let listener: ListenerRef<u32> = ListenerFn::new("collect", move |v: Arc<u32>| {
            let sink = Arc::clone(&sink);
            async move { sink.lock().unwrap().push(*v) }
        })
        .on_complete(move || done_flag.store(true, Ordering::SeqCst))
        .on_error(move |e| *failure.lock().unwrap() = Some(e.clone()))
        .into_ref();

        listener.on_data_ready(Arc::new(4)).await;
        listener.on_data_ready(Arc::new(5)).await;
        listener.on_data_complete().await;
        listener
            .on_data_error(&StreamError::producer("gone"))
            .await;

        assert_eq!(*seen.lock().unwrap(), vec![4, 5]);
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(
            *failed.lock().unwrap(),
            Some(StreamError::producer("gone"))
        );
        assert_eq!(listener.name(), "collect");
    }
}
