//! Notification hub: the live set of change subscribers, their invocation
//! order, and their cleanup lifecycle.
//!
//! Handlers are stored in an insertion-ordered set keyed by identity. A
//! notify pass runs over a snapshot, so handlers added or removed while a
//! pass is running do not affect that pass; a removed handler is never
//! invoked by any later pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

pub(crate) type Handler<D> = Arc<dyn Fn(&D) + Send + Sync>;

/// Identity of a registered handler.
///
/// Shared handlers (subscribed as an `Arc`) are keyed by the allocation
/// address, so re-subscribing a clone of the same `Arc` replaces the earlier
/// entry. Plain closures get a fresh identity per subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandlerKey {
    Shared(usize),
    Owned(u64),
}

struct HandlerEntry<D> {
    key: HandlerKey,
    handler: Handler<D>,
}

pub(crate) struct NotificationHub<D> {
    entries: Arc<Mutex<Vec<HandlerEntry<D>>>>,
    owned_seq: AtomicU64,
}

impl<D> Default for NotificationHub<D> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            owned_seq: AtomicU64::new(0),
        }
    }
}

impl<D: 'static> NotificationHub<D> {
    /// Fresh identity for a plain closure.
    pub fn next_owned_key(&self) -> HandlerKey {
        HandlerKey::Owned(self.owned_seq.fetch_add(1, Ordering::Relaxed))
    }

    /// Identity of a shared handler, derived from its allocation.
    pub fn shared_key(handler: &Handler<D>) -> HandlerKey {
        HandlerKey::Shared(Arc::as_ptr(handler) as *const () as usize)
    }

    /// Insert `handler` under `key`, replacing an existing entry with the
    /// same identity in place (the original position is kept).
    pub fn subscribe(&self, key: HandlerKey, handler: Handler<D>) -> Subscription {
        {
            let mut entries = self.entries.lock().unwrap();
            match entries.iter_mut().find(|entry| entry.key == key) {
                Some(existing) => existing.handler = handler,
                None => entries.push(HandlerEntry { key, handler }),
            }
        }

        let entries = Arc::downgrade(&self.entries);
        Subscription {
            remove: Arc::new(move || {
                if let Some(entries) = entries.upgrade() {
                    entries.lock().unwrap().retain(|entry| entry.key != key);
                }
            }),
        }
    }

    /// Invoke every currently registered handler, in insertion order.
    pub fn notify(&self, document: &D) {
        let snapshot: Vec<Handler<D>> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.handler.clone())
            .collect();

        debug!("Notifying {} language change handlers", snapshot.len());
        for handler in snapshot {
            handler(document);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Handle that removes a handler from the hub.
///
/// Removal is idempotent and safe to call from inside a notify pass. Dropping
/// the handle without calling [`dispose`](Subscription::dispose) leaves the
/// handler registered (manual-cleanup semantics); bind the subscription to a
/// [`Scope`] for automatic removal.
#[derive(Clone)]
pub struct Subscription {
    remove: Arc<dyn Fn() + Send + Sync>,
}

impl Subscription {
    pub fn dispose(&self) {
        (self.remove)();
    }

    /// Remove the handler when `scope` ends, whichever of scope end and
    /// manual disposal comes first.
    pub(crate) fn bind_to(&self, scope: &Scope) {
        let remove = self.remove.clone();
        scope.on_end(move || remove());
    }
}

/// A value representing "this handler's owning context".
///
/// Cleanup callbacks registered with [`on_end`](Scope::on_end) run exactly
/// once, in registration order, when the scope ends. Ending twice is a no-op;
/// registering after the end runs the callback immediately.
#[derive(Default)]
pub struct Scope {
    inner: Mutex<ScopeInner>,
}

#[derive(Default)]
struct ScopeInner {
    ended: bool,
    callbacks: Vec<Box<dyn FnOnce() + Send>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_end(&self, callback: impl FnOnce() + Send + 'static) {
        {
            let mut inner = self.inner.lock().unwrap();
            if !inner.ended {
                inner.callbacks.push(Box::new(callback));
                return;
            }
        }
        callback();
    }

    pub fn end(&self) {
        let callbacks = {
            let mut inner = self.inner.lock().unwrap();
            if inner.ended {
                return;
            }
            inner.ended = true;
            std::mem::take(&mut inner.callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }
}

/// Options for subscribing a change handler.
#[derive(Default)]
pub struct SubscribeOptions<'a> {
    /// Invoke the handler once, synchronously, at subscribe time if a
    /// document is already loaded.
    pub run_now: bool,
    /// Remove the handler automatically when this scope ends.
    pub scope: Option<&'a Scope>,
}
