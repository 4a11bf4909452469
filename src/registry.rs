//! Language registry: single source of truth for all registered languages.
//!
//! The registry holds the ordered catalog of language descriptors together
//! with the alias table used for locale inference. It is populated once while
//! the engine is being built and is immutable afterwards.

use std::collections::HashMap;

use crate::error::EngineError;

/// Where a language pack document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSource {
    /// A complete URL, fetched as-is.
    Url(String),
    /// A file name resolved against the configured base URL.
    File(String),
}

/// Registration record for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageDescriptor {
    /// Unique, case-sensitive key (e.g. "en", "de").
    pub key: String,
    /// Human-readable name shown in a language picker.
    pub display_name: String,
    /// Location of the pack document.
    pub source: LanguageSource,
}

impl LanguageDescriptor {
    /// Descriptor backed by a complete URL.
    pub fn url(
        key: impl Into<String>,
        display_name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            source: LanguageSource::Url(url.into()),
        }
    }

    /// Descriptor backed by a file name under the configured base URL.
    pub fn file(
        key: impl Into<String>,
        display_name: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            source: LanguageSource::File(file_name.into()),
        }
    }
}

/// One `{key, display name}` pair of the catalog, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: String,
    pub display_name: String,
}

/// Ordered language catalog plus the lower-cased alias table.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: Vec<LanguageDescriptor>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
}

impl Registry {
    /// Append descriptors to the catalog, preserving order.
    ///
    /// Registering a [`LanguageSource::File`] descriptor requires a base URL
    /// to already be configured; otherwise registration fails with
    /// [`EngineError::Configuration`]. Registering an existing key replaces
    /// the earlier entry in place (the catalog position is kept).
    pub fn register(
        &mut self,
        descriptors: impl IntoIterator<Item = LanguageDescriptor>,
        base_url: Option<&str>,
    ) -> Result<(), EngineError> {
        for descriptor in descriptors {
            if matches!(descriptor.source, LanguageSource::File(_)) && base_url.is_none() {
                return Err(EngineError::Configuration {
                    key: descriptor.key,
                });
            }

            match self.index.get(&descriptor.key) {
                Some(&position) => {
                    self.entries[position] = descriptor;
                }
                None => {
                    self.index
                        .insert(descriptor.key.clone(), self.entries.len());
                    self.entries.push(descriptor);
                }
            }
        }
        Ok(())
    }

    /// Insert aliases for `key`, lower-casing every tag.
    ///
    /// Last writer wins on collision; this is overwrite semantics, not an
    /// error. Aliases are not validated against the catalog: an alias may
    /// name a key that is registered later (or never).
    pub fn add_aliases(
        &mut self,
        key: impl Into<String>,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) {
        let key = key.into();
        for tag in tags {
            self.aliases.insert(tag.into().to_lowercase(), key.clone());
        }
    }

    /// Look up a descriptor by its exact key.
    pub fn get(&self, key: &str) -> Option<&LanguageDescriptor> {
        self.index.get(key).map(|&position| &self.entries[position])
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Resolve a locale tag through the alias table.
    ///
    /// Matching is case-insensitive and exact; `en-US` does not fall back to
    /// `en` unless `en-us` was aliased explicitly.
    pub fn alias_lookup(&self, tag: &str) -> Option<&str> {
        self.aliases.get(&tag.to_lowercase()).map(String::as_str)
    }

    /// The full catalog in registration order.
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.entries
            .iter()
            .map(|descriptor| CatalogEntry {
                key: descriptor.key.clone(),
                display_name: descriptor.display_name.clone(),
            })
            .collect()
    }
}
