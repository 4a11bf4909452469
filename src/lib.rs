//! Language pack resolution, loading, and hot-swap engine.
//!
//! This crate picks an active language from registered options, a persisted
//! preference, and ordered locale preferences; fetches the corresponding
//! pack document; atomically swaps it into the current state; and notifies
//! subscribers in a defined order. Collaborators (transport, preference
//! store, locale source, style sink) are traits supplied by the host.
//!
//! # Architecture
//!
//! - `registry`: ordered catalog of language descriptors plus the alias table
//! - `resolver`: persisted choice > locale inference > fallback
//! - `engine`: activation (fetch, atomic swap, fan-out) and the read surface
//! - `hub`: ordered subscriber set with scope-bound and manual cleanup
//! - `state`: active key/document cell and pull-on-read section views
//! - `style`: direction/font metadata and the optional style projection
//!
//! # Example
//!
//! ```rust,ignore
//! use langpack::{LanguageDescriptor, LanguageEngine};
//!
//! let engine = LanguageEngine::<MyPack>::builder()
//!     .base_url("https://cdn.example.com/i18n")
//!     .register(vec![
//!         LanguageDescriptor::file("en", "English", "en.json"),
//!         LanguageDescriptor::file("de", "Deutsch", "de.json"),
//!     ])?
//!     .aliases([("en", vec!["en", "en-US"]), ("de", vec!["de", "de-DE"])])
//!     .build();
//!
//! engine.set_preferred("en").await?;
//! let title = engine.section(|pack: &MyPack| pack.title.clone());
//! ```

mod config;
mod engine;
mod error;
mod hub;
mod registry;
mod resolver;
mod state;
mod store;
mod style;
mod transport;

pub use config::{EngineBuilder, DEFAULT_PERSIST_KEY};
pub use engine::LanguageEngine;
pub use error::{EngineError, TransportError};
pub use hub::{Scope, SubscribeOptions, Subscription};
pub use registry::{CatalogEntry, LanguageDescriptor, LanguageSource};
pub use resolver::{EnvLocales, LocaleSource, ResolveOptions, StaticLocales};
pub use state::{Section, StrictSection};
pub use store::{FileStore, MemoryStore, PreferenceStore};
pub use style::{
    Direction, FontFace, FontStyle, FontWeight, StyleAware, StyleBlock, StyleSink,
};
pub use transport::{HttpTransport, Transport};
