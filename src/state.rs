//! Active language state and its derived read-only views.
//!
//! The current key and the current document live under one lock and are
//! swapped together, so readers never observe a key that has advanced ahead
//! of its document (or the other way around).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct ActiveState<D> {
    current_key: Option<String>,
    document: Option<Arc<D>>,
}

impl<D> Default for ActiveState<D> {
    fn default() -> Self {
        Self {
            current_key: None,
            document: None,
        }
    }
}

/// The engine's single mutable cell: current key + current document.
pub(crate) struct StateCell<D> {
    inner: Mutex<ActiveState<D>>,
}

impl<D> Default for StateCell<D> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(ActiveState::default()),
        }
    }
}

impl<D> StateCell<D> {
    pub fn loaded(&self) -> bool {
        self.inner.lock().unwrap().document.is_some()
    }

    pub fn current_key(&self) -> Option<String> {
        self.inner.lock().unwrap().current_key.clone()
    }

    pub fn document(&self) -> Option<Arc<D>> {
        self.inner.lock().unwrap().document.clone()
    }

    /// Key and document of the same swap, read together.
    pub fn snapshot(&self) -> (Option<String>, Option<Arc<D>>) {
        let state = self.inner.lock().unwrap();
        (state.current_key.clone(), state.document.clone())
    }

    /// Install `document` under `key` if `seq` is still the latest issued
    /// activation. Returns false (state untouched) for a stale activation.
    ///
    /// The check happens under the state lock so a stale fetch that lost the
    /// race cannot overwrite the winner.
    pub fn install_if_latest(
        &self,
        seq: u64,
        latest: &AtomicU64,
        key: &str,
        document: Arc<D>,
    ) -> bool {
        let mut state = self.inner.lock().unwrap();
        if latest.load(Ordering::SeqCst) != seq {
            return false;
        }
        state.current_key = Some(key.to_string());
        state.document = Some(document);
        true
    }
}

/// Read-only derived view over the loaded document.
///
/// Recomputes on every read; yields `None` while nothing is loaded, without
/// invoking the extractor.
pub struct Section<T> {
    read: Arc<dyn Fn() -> Option<T> + Send + Sync>,
}

impl<T> Clone for Section<T> {
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
        }
    }
}

impl<T> Section<T> {
    pub(crate) fn new(read: impl Fn() -> Option<T> + Send + Sync + 'static) -> Self {
        Self {
            read: Arc::new(read),
        }
    }

    pub fn get(&self) -> Option<T> {
        (self.read)()
    }
}

/// Like [`Section`], for callers asserting a document is already loaded.
///
/// Reading while nothing is loaded panics; that is the documented contract
/// violation, not a recoverable condition.
pub struct StrictSection<T> {
    read: Arc<dyn Fn() -> T + Send + Sync>,
}

impl<T> Clone for StrictSection<T> {
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
        }
    }
}

impl<T> StrictSection<T> {
    pub(crate) fn new(read: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            read: Arc::new(read),
        }
    }

    pub fn get(&self) -> T {
        (self.read)()
    }
}
