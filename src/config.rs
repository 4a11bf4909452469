//! Engine construction: immutable configuration plus the builder that
//! collects registrations and collaborator capabilities.
//!
//! There is one canonical registration shape: a batch of descriptors via
//! [`EngineBuilder::register`] plus a separate alias batch via
//! [`EngineBuilder::aliases`].

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::engine::LanguageEngine;
use crate::error::EngineError;
use crate::hub::Handler;
use crate::registry::{LanguageDescriptor, Registry};
use crate::resolver::{EnvLocales, LocaleSource};
use crate::store::PreferenceStore;
use crate::style::{self, StyleAware, StyleSink};
use crate::transport::{HttpTransport, Transport};

/// Persistence key used by [`EngineBuilder::persist`].
pub const DEFAULT_PERSIST_KEY: &str = "ls-ln";

/// Immutable engine configuration, fixed at build time.
#[derive(Debug, Clone)]
pub(crate) struct EngineConfig {
    pub base_url: Option<String>,
    pub persist_key: Option<String>,
    pub project_style: bool,
}

/// Builder for [`LanguageEngine`].
///
/// Collaborators not supplied explicitly get defaults: an HTTP transport,
/// environment-derived locale preferences, and no persistence.
pub struct EngineBuilder<D> {
    base_url: Option<String>,
    persist_key: Option<String>,
    registry: Registry,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn PreferenceStore>>,
    locales: Option<Arc<dyn LocaleSource>>,
    style_handler: Option<Handler<D>>,
    _doc: PhantomData<fn() -> D>,
}

impl<D> Default for EngineBuilder<D> {
    fn default() -> Self {
        Self {
            base_url: None,
            persist_key: None,
            registry: Registry::default(),
            transport: None,
            store: None,
            locales: None,
            style_handler: None,
            _doc: PhantomData,
        }
    }
}

impl<D: DeserializeOwned + Send + Sync + 'static> EngineBuilder<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL that file-based descriptors are resolved against.
    ///
    /// Must be set before registering any [`LanguageSource::File`]
    /// descriptor. Trailing slashes are trimmed.
    ///
    /// [`LanguageSource::File`]: crate::registry::LanguageSource::File
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        self.base_url = Some(url);
        self
    }

    /// Register a batch of language descriptors, preserving order.
    ///
    /// Fails with [`EngineError::Configuration`] when a file-based descriptor
    /// is registered while no base URL is configured.
    pub fn register(
        mut self,
        descriptors: impl IntoIterator<Item = LanguageDescriptor>,
    ) -> Result<Self, EngineError> {
        self.registry
            .register(descriptors, self.base_url.as_deref())?;
        Ok(self)
    }

    /// Register locale-tag aliases, keyed by language key.
    ///
    /// Tags are lower-cased; on collision the last writer wins.
    pub fn aliases<K, T, A>(mut self, table: impl IntoIterator<Item = (K, T)>) -> Self
    where
        K: Into<String>,
        T: IntoIterator<Item = A>,
        A: Into<String>,
    {
        for (key, tags) in table {
            self.registry.add_aliases(key, tags);
        }
        self
    }

    /// Persist the chosen language under [`DEFAULT_PERSIST_KEY`].
    pub fn persist(self, store: Arc<dyn PreferenceStore>) -> Self {
        self.persist_with_key(store, DEFAULT_PERSIST_KEY)
    }

    /// Persist the chosen language under a custom key.
    pub fn persist_with_key(
        mut self,
        store: Arc<dyn PreferenceStore>,
        key: impl Into<String>,
    ) -> Self {
        self.store = Some(store);
        self.persist_key = Some(key.into());
        self
    }

    /// Locale preference source consulted during resolution.
    pub fn locales(mut self, locales: Arc<dyn LocaleSource>) -> Self {
        self.locales = Some(locales);
        self
    }

    /// Transport used to fetch pack documents.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Install the built-in style projection subscriber.
    ///
    /// It is subscribed at build time, ahead of any user handler, and writes
    /// the document's direction and font roles to `sink` on every change.
    pub fn project_style(mut self, sink: Arc<dyn StyleSink>) -> Self
    where
        D: StyleAware,
    {
        self.style_handler = Some(Arc::new(move |document: &D| {
            style::project(sink.as_ref(), document)
        }));
        self
    }

    pub fn build(self) -> LanguageEngine<D> {
        let config = EngineConfig {
            base_url: self.base_url,
            persist_key: self.persist_key,
            project_style: self.style_handler.is_some(),
        };

        LanguageEngine::assemble(
            config,
            self.registry,
            self.transport
                .unwrap_or_else(|| Arc::new(HttpTransport::new())),
            self.store,
            self.locales.unwrap_or_else(|| Arc::new(EnvLocales::new())),
            self.style_handler,
        )
    }
}
