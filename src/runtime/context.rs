use std::{
    sync::{Arc, Mutex, PoisonError},
    thread,
    time::Duration,
};

use crossbeam::channel::{after, bounded, select, Receiver, Sender};

#[derive(Clone)]
#[repr(transparent)]
/// Represents an ongoing operation which could be cancelled in the future.
/// Inspired by contexts in the Go programming language.
///
/// A context can be cancelled by calling its [`Context::cancel()`] method;
/// this wakes anything waiting on its [`Context::done()`] channel.
pub struct Context(Arc<ContextValue>);

impl Context {
    #[inline]
    /// Creates a new global context.
    pub fn new_global() -> Self {
        Self::new_global_ext(None)
    }

    /// Construct a new global context with a name, which shows up in logs.
    pub fn new_global_ext(name: Option<String>) -> Self {
        let (sender, done) = bounded(0);
        Self(Arc::new(ContextValue {
            name,
            sender: Mutex::new(Some(sender)),
            done,
        }))
    }

    #[inline]
    /// Cancels a context. This is a no-op if the context is already cancelled.
    pub fn cancel(&self) {
        if self.0.sender().take().is_some() {
            log::debug!("Explicit cancel: {}", self.name());
        }
    }

    /// Gets the name of the context.
    pub fn name(&self) -> &str {
        self.0.name.as_ref().map_or("<anon>", String::as_str)
    }

    /// Checks whether the context has been cancelled.
    pub fn is_done(&self) -> bool {
        self.0.sender().is_none()
    }

    /// A channel which becomes disconnected when the context is cancelled.
    ///
    /// Nothing is ever sent on it, so a `recv` arm on it in a
    /// [`select!`](crossbeam::channel::select) fires exactly on cancellation.
    pub fn done(&self) -> &Receiver<()> {
        &self.0.done
    }

    /// Waits for a value on `rx` unless the context is cancelled first.
    ///
    /// Returns [`None`] on cancellation or when `rx` is disconnected.
    pub fn wrap<T>(&self, rx: &Receiver<T>) -> Option<T> {
        if self.is_done() {
            return None;
        }
        select! {
            recv(rx) -> msg => msg.ok(),
            recv(self.done()) -> _ => None,
        }
    }

    /// Sleeps for `dur` unless the context is cancelled first.
    ///
    /// Returns `true` if the full duration elapsed.
    pub fn sleep(&self, dur: Duration) -> bool {
        if dur == Duration::ZERO {
            thread::yield_now();
            return !self.is_done();
        }
        self.wrap(&after(dur)).is_some()
    }
}

struct ContextValue {
    name: Option<String>,
    sender: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

impl ContextValue {
    fn sender(&self) -> std::sync::MutexGuard<'_, Option<Sender<()>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
