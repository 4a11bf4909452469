//! Preference resolution: turn persisted choice, locale preferences, and a
//! fallback into exactly one registered language key.

use tracing::debug;

use crate::registry::Registry;
use crate::store::PreferenceStore;

/// Ordered locale preference source, most preferred first.
///
/// Read once per resolve call.
pub trait LocaleSource: Send + Sync {
    fn preferred(&self) -> Vec<String>;
}

/// Fixed list of locale tags.
#[derive(Debug, Clone, Default)]
pub struct StaticLocales {
    tags: Vec<String>,
}

impl StaticLocales {
    pub fn new(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

impl LocaleSource for StaticLocales {
    fn preferred(&self) -> Vec<String> {
        self.tags.clone()
    }
}

/// Locale preferences inferred from the process environment.
///
/// Reads `LANGUAGE` (colon-separated list) first, then `LC_ALL`,
/// `LC_MESSAGES`, and `LANG`. Codeset suffixes (`en_US.UTF-8`) are stripped,
/// underscores become hyphens, and `C`/`POSIX` entries are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvLocales;

impl EnvLocales {
    pub fn new() -> Self {
        Self
    }
}

fn normalize_env_tag(raw: &str) -> Option<String> {
    let tag = raw.trim();
    let tag = tag.split('.').next().unwrap_or(tag);
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }
    Some(tag.replace('_', "-"))
}

impl LocaleSource for EnvLocales {
    fn preferred(&self) -> Vec<String> {
        let mut tags = Vec::new();

        if let Ok(list) = std::env::var("LANGUAGE") {
            tags.extend(list.split(':').filter_map(normalize_env_tag));
        }
        for var in ["LC_ALL", "LC_MESSAGES", "LANG"] {
            if let Ok(value) = std::env::var(var) {
                tags.extend(normalize_env_tag(&value));
            }
        }

        // Dedup, preserve order.
        let mut out = Vec::new();
        for tag in tags {
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
        out
    }
}

/// Which resolution signals to consult.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Consult the persisted preference (when persistence is configured).
    pub try_persisted: bool,
    /// Consult the ordered locale preference list via the alias table.
    pub try_locales: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            try_persisted: true,
            try_locales: true,
        }
    }
}

/// Pick one language key, first match wins:
///
/// 1. the persisted value, if it names a registered key;
/// 2. the first preferred locale tag with an alias table hit;
/// 3. `fallback`, verbatim.
///
/// The fallback is deliberately not validated against the registry; an
/// unregistered fallback surfaces as an unknown-language error at activation,
/// not here.
pub(crate) fn resolve_key(
    registry: &Registry,
    store: Option<&dyn PreferenceStore>,
    persist_key: Option<&str>,
    locales: &dyn LocaleSource,
    fallback: &str,
    options: ResolveOptions,
) -> String {
    if options.try_persisted {
        if let (Some(store), Some(persist_key)) = (store, persist_key) {
            if let Some(persisted) = store.get(persist_key) {
                if registry.contains(&persisted) {
                    debug!("Resolved language {persisted:?} from persisted preference");
                    return persisted;
                }
                debug!("Ignoring persisted language {persisted:?}: not registered");
            }
        }
    }

    if options.try_locales {
        for tag in locales.preferred() {
            if let Some(key) = registry.alias_lookup(&tag) {
                debug!("Resolved language {key:?} from locale tag {tag:?}");
                return key.to_string();
            }
        }
    }

    debug!("Resolved language {fallback:?} from fallback");
    fallback.to_string()
}
