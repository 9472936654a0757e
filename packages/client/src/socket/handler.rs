//! Callback registries for the observer pattern.
//!
//! Each client instance owns three independent registries (message, error,
//! status). There is no process-wide registry: subscribing returns a
//! [`Subscription`] disposer that removes exactly the handler it was created
//! for, leaving every other subscription untouched. Registries survive
//! reconnects; only an explicit unsubscribe removes a handler.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

type BoxedHandler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct RegistryInner<T> {
    next_id: u64,
    handlers: BTreeMap<u64, BoxedHandler<T>>,
}

/// An ordered set of callbacks keyed by subscription id.
///
/// Notification iterates in subscription order — an unspecified but stable
/// order as far as subscribers are concerned.
pub(crate) struct HandlerRegistry<T> {
    inner: Arc<Mutex<RegistryInner<T>>>,
}

impl<T> HandlerRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                next_id: 0,
                handlers: BTreeMap::new(),
            })),
        }
    }

    /// Register `handler` and return its disposer.
    pub(crate) fn subscribe(
        &self,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) -> Subscription
    where
        T: 'static,
    {
        let id = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.handlers.insert(id, Arc::new(handler));
            id
        };

        let weak = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.lock().unwrap().handlers.remove(&id);
                }
            }),
        }
    }

    /// Invoke every currently registered handler with `value`, synchronously
    /// and in subscription order.
    ///
    /// The registry lock is not held while handlers run, so a handler may
    /// subscribe, unsubscribe or call back into the client.
    pub(crate) fn notify(&self, value: &T) {
        let handlers: Vec<BoxedHandler<T>> = {
            let inner = self.inner.lock().unwrap();
            inner.handlers.values().cloned().collect()
        };
        for handler in handlers {
            handler(value);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().handlers.len()
    }
}

/// Disposer for one registered handler.
///
/// Dropping the token without calling [`Subscription::unsubscribe`] leaves
/// the handler registered for the lifetime of the client.
pub struct Subscription {
    cancel: Box<dyn FnOnce() + Send>,
}

impl Subscription {
    /// Remove exactly the handler this token was returned for.
    pub fn unsubscribe(self) {
        (self.cancel)();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
