//! The language engine: resolution, activation, and the read surface over
//! the active state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::{EngineBuilder, EngineConfig};
use crate::error::{EngineError, TransportError};
use crate::hub::{Handler, HandlerKey, NotificationHub, Scope, SubscribeOptions, Subscription};
use crate::registry::{CatalogEntry, LanguageSource, Registry};
use crate::resolver::{self, LocaleSource, ResolveOptions};
use crate::state::{Section, StateCell, StrictSection};
use crate::store::PreferenceStore;
use crate::transport::Transport;

/// Language pack resolution and hot-swap engine.
///
/// Cheaply cloneable handle; clones share the same state, registry, and
/// subscriber set. The document type `D` is the host's pack model, decoded
/// from JSON on every successful fetch.
pub struct LanguageEngine<D> {
    inner: Arc<EngineInner<D>>,
}

impl<D> Clone for LanguageEngine<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct EngineInner<D> {
    config: EngineConfig,
    registry: Registry,
    transport: Arc<dyn Transport>,
    store: Option<Arc<dyn PreferenceStore>>,
    locales: Arc<dyn LocaleSource>,
    state: StateCell<D>,
    hub: NotificationHub<D>,
    activation_seq: AtomicU64,
}

impl<D: DeserializeOwned + Send + Sync + 'static> LanguageEngine<D> {
    pub fn builder() -> EngineBuilder<D> {
        EngineBuilder::new()
    }

    pub(crate) fn assemble(
        config: EngineConfig,
        registry: Registry,
        transport: Arc<dyn Transport>,
        store: Option<Arc<dyn PreferenceStore>>,
        locales: Arc<dyn LocaleSource>,
        style_handler: Option<Handler<D>>,
    ) -> Self {
        let engine = Self {
            inner: Arc::new(EngineInner {
                config,
                registry,
                transport,
                store,
                locales,
                state: StateCell::default(),
                hub: NotificationHub::default(),
                activation_seq: AtomicU64::new(0),
            }),
        };

        // The projection subscriber goes in first so it sees every change
        // before later-registered user handlers.
        if let Some(handler) = style_handler {
            engine
                .inner
                .hub
                .subscribe(engine.inner.hub.next_owned_key(), handler);
        }

        engine
    }

    // ==================== Resolution ====================

    /// Pick a language key from persisted preference, locale inference, and
    /// `fallback`, in that order. See [`ResolveOptions`].
    ///
    /// The fallback is returned verbatim, unvalidated; activating an
    /// unregistered fallback fails downstream with
    /// [`EngineError::UnknownLanguage`].
    pub fn resolve(&self, fallback: &str, options: ResolveOptions) -> String {
        resolver::resolve_key(
            &self.inner.registry,
            self.inner.store.as_deref(),
            self.inner.config.persist_key.as_deref(),
            self.inner.locales.as_ref(),
            fallback,
            options,
        )
    }

    /// Resolve with default options and activate the result.
    pub async fn set_preferred(&self, fallback: &str) -> Result<(), EngineError> {
        let key = self.resolve(fallback, ResolveOptions::default());
        self.activate(&key).await
    }

    // ==================== Activation ====================

    /// Fetch the pack for `key` and, on success, swap it in and notify
    /// subscribers.
    ///
    /// An unregistered `key` is a programmer error and fails with
    /// [`EngineError::UnknownLanguage`]. A transport or decode failure is
    /// recovered locally: it is logged, the state stays as it was, nobody is
    /// notified, and `Ok(())` is returned. Overlapping activations are
    /// sequenced; a fetch that completes after a newer activation was issued
    /// is discarded.
    pub async fn activate(&self, key: &str) -> Result<(), EngineError> {
        let inner = &self.inner;

        let descriptor = inner
            .registry
            .get(key)
            .ok_or_else(|| EngineError::UnknownLanguage(key.to_string()))?;

        let url = match &descriptor.source {
            LanguageSource::Url(url) => url.clone(),
            LanguageSource::File(file_name) => {
                let base = inner.config.base_url.as_deref().ok_or_else(|| {
                    EngineError::Configuration {
                        key: key.to_string(),
                    }
                })?;
                format!("{base}/{file_name}")
            }
        };

        // Write-then-fetch: a reload mid-flight already remembers the
        // attempted choice.
        if let (Some(store), Some(persist_key)) = (&inner.store, &inner.config.persist_key) {
            store.set(persist_key, key);
        }

        let seq = inner.activation_seq.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Activating language {key:?} from {url}");

        let body = match inner.transport.fetch(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Language fetch for {key:?} failed: {e}");
                return Ok(());
            }
        };

        let document: D = match serde_json::from_str(&body).map_err(TransportError::from) {
            Ok(document) => document,
            Err(e) => {
                warn!("Language pack for {key:?} was rejected: {e}");
                return Ok(());
            }
        };

        let document = Arc::new(document);
        if !inner
            .state
            .install_if_latest(seq, &inner.activation_seq, key, document.clone())
        {
            debug!("Discarding stale fetch for {key:?}: a newer activation superseded it");
            return Ok(());
        }

        inner.hub.notify(&document);
        Ok(())
    }

    // ==================== Subscriptions ====================

    /// Subscribe a change handler with default options.
    pub fn on_change(&self, handler: impl Fn(&D) + Send + Sync + 'static) -> Subscription {
        self.on_change_with(SubscribeOptions::default(), handler)
    }

    /// Subscribe a change handler.
    ///
    /// Each call registers a fresh entry; use [`on_change_arc`] when
    /// re-subscribing should replace an earlier registration.
    ///
    /// [`on_change_arc`]: LanguageEngine::on_change_arc
    pub fn on_change_with(
        &self,
        options: SubscribeOptions<'_>,
        handler: impl Fn(&D) + Send + Sync + 'static,
    ) -> Subscription {
        let key = self.inner.hub.next_owned_key();
        self.subscribe(options, key, Arc::new(handler))
    }

    /// Subscribe a shared handler, keyed by its allocation.
    ///
    /// Subscribing a clone of the same `Arc` again replaces the earlier
    /// entry instead of duplicating it.
    pub fn on_change_arc(
        &self,
        options: SubscribeOptions<'_>,
        handler: Arc<dyn Fn(&D) + Send + Sync>,
    ) -> Subscription {
        let key = NotificationHub::shared_key(&handler);
        self.subscribe(options, key, handler)
    }

    fn subscribe(
        &self,
        options: SubscribeOptions<'_>,
        key: HandlerKey,
        handler: Handler<D>,
    ) -> Subscription {
        // run_now fires before the handler joins the set, so a load racing
        // this subscribe cannot double-invoke it.
        if options.run_now {
            if let Some(document) = self.inner.state.document() {
                handler(&document);
            }
        }

        let subscription = self.inner.hub.subscribe(key, handler);
        if let Some(scope) = options.scope {
            subscription.bind_to(scope);
        }
        subscription
    }

    /// Convenience wrapper: subscribe bound to `scope`.
    pub fn on_change_scoped(
        &self,
        scope: &Scope,
        handler: impl Fn(&D) + Send + Sync + 'static,
    ) -> Subscription {
        self.on_change_with(
            SubscribeOptions {
                run_now: false,
                scope: Some(scope),
            },
            handler,
        )
    }

    // ==================== State Projection ====================

    /// Whether a pack document is currently loaded.
    pub fn loaded(&self) -> bool {
        self.inner.state.loaded()
    }

    /// Key of the active language, if one is loaded.
    pub fn current_key(&self) -> Option<String> {
        self.inner.state.current_key()
    }

    /// Catalog entry of the active language, if one is loaded.
    pub fn current(&self) -> Option<CatalogEntry> {
        let (key, _) = self.inner.state.snapshot();
        let descriptor = self.inner.registry.get(&key?)?;
        Some(CatalogEntry {
            key: descriptor.key.clone(),
            display_name: descriptor.display_name.clone(),
        })
    }

    /// The full ordered catalog, for language pickers.
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.inner.registry.catalog()
    }

    /// Whether the built-in style projection subscriber is installed.
    pub fn style_projection_enabled(&self) -> bool {
        self.inner.config.project_style
    }

    /// Derived read-only view over the loaded document.
    ///
    /// Recomputes on every read; yields `None` while nothing is loaded,
    /// without invoking `extract`.
    pub fn section<T>(&self, extract: impl Fn(&D) -> T + Send + Sync + 'static) -> Section<T> {
        let inner = self.inner.clone();
        Section::new(move || inner.state.document().map(|document| extract(&document)))
    }

    /// Like [`section`](LanguageEngine::section), for callers asserting a
    /// document is already loaded.
    ///
    /// # Panics
    ///
    /// Reading the returned view panics while nothing is loaded.
    pub fn section_unchecked<T>(
        &self,
        extract: impl Fn(&D) -> T + Send + Sync + 'static,
    ) -> StrictSection<T> {
        let inner = self.inner.clone();
        StrictSection::new(move || {
            let document = inner
                .state
                .document()
                .expect("no language pack loaded; activate one before reading this section");
            extract(&document)
        })
    }
}
