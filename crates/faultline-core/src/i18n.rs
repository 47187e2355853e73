//! Localization of error messages.
//!
//! [`LocalizationResolver`] turns an error key and a language tag into
//! display text with a three-tier fallback:
//!
//! ```text
//! exact tag ("en-US") → base tag ("en") → definition default
//! ```
//!
//! Resolved text is memoized per `(key, language)` and stays pinned even if
//! the catalog changes later. Unknown keys are never memoized, so a key
//! registered after a miss is picked up on the next call.

use crate::definition::DefinitionCatalog;
use dashmap::DashMap;
use std::sync::Arc;

/// Language used when a caller does not supply one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Resolves localized error text against a [`DefinitionCatalog`].
///
/// # Example
///
/// ```
/// use faultline_core::{DefinitionCatalog, ErrorDefinition, LocalizationResolver};
/// use std::sync::Arc;
///
/// let catalog = Arc::new(DefinitionCatalog::new());
/// catalog
///     .register(
///         "teapot",
///         ErrorDefinition::new("teapot", 418, "I'm a teapot")
///             .with_translation("fr", "Je suis une théière"),
///     )
///     .unwrap();
///
/// let resolver = LocalizationResolver::new(catalog);
/// assert_eq!(resolver.resolve("teapot", "fr-CA").as_deref(), Some("Je suis une théière"));
/// assert_eq!(resolver.resolve("teapot", "de").as_deref(), Some("I'm a teapot"));
/// assert_eq!(resolver.resolve("unknown", "fr"), None);
/// ```
#[derive(Debug)]
pub struct LocalizationResolver {
    catalog: Arc<DefinitionCatalog>,
    default_language: String,
    cache: DashMap<(String, String), String>,
}

impl LocalizationResolver {
    /// Creates a resolver that defaults to [`DEFAULT_LANGUAGE`].
    #[must_use]
    pub fn new(catalog: Arc<DefinitionCatalog>) -> Self {
        Self::with_default_language(catalog, DEFAULT_LANGUAGE)
    }

    /// Creates a resolver with a custom default language.
    #[must_use]
    pub fn with_default_language(
        catalog: Arc<DefinitionCatalog>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            default_language: default_language.into(),
            cache: DashMap::new(),
        }
    }

    /// Returns the catalog this resolver reads from.
    #[must_use]
    pub fn catalog(&self) -> &Arc<DefinitionCatalog> {
        &self.catalog
    }

    /// Returns the language used for empty tags.
    #[must_use]
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Resolves the display text for `key` in `language`.
    ///
    /// Returns `None` if `key` is not in the catalog; the caller then falls
    /// back to its own message.
    pub fn resolve(&self, key: &str, language: &str) -> Option<String> {
        let language = if language.is_empty() {
            self.default_language.as_str()
        } else {
            language
        };

        let cache_key = (key.to_string(), language.to_string());
        if let Some(text) = self.cache.get(&cache_key) {
            return Some(text.value().clone());
        }

        let definition = self.catalog.lookup(key)?;

        let text = definition
            .translation(language)
            .or_else(|| {
                base_language(language).and_then(|base| definition.translation(base))
            })
            .unwrap_or(definition.default_text.as_str())
            .to_string();

        // A concurrent resolver may have cached first; keep whichever landed.
        let pinned = self.cache.entry(cache_key).or_insert(text);
        Some(pinned.value().clone())
    }

    /// Returns the number of memoized `(key, language)` pairs.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Drops every memoized entry.
    ///
    /// Only needed by hosts that deliberately mutate the catalog after
    /// serving traffic.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Returns the base subtag of a region-qualified tag (`en-US` → `en`).
fn base_language(language: &str) -> Option<&str> {
    language
        .split_once('-')
        .map(|(base, _)| base)
        .filter(|base| !base.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ErrorDefinition, RegistrationPolicy};
    use proptest::prelude::*;

    fn teapot() -> ErrorDefinition {
        ErrorDefinition::new("teapot", 418, "I'm a teapot")
            .with_translation("en", "I'm a teapot")
            .with_translation("fr", "Je suis une théière")
            .exposed()
    }

    fn resolver_with(defs: Vec<ErrorDefinition>) -> LocalizationResolver {
        let catalog = Arc::new(DefinitionCatalog::new());
        catalog.register_all(defs).unwrap();
        LocalizationResolver::new(catalog)
    }

    #[test]
    fn test_exact_match() {
        let resolver = resolver_with(vec![teapot()]);
        assert_eq!(
            resolver.resolve("teapot", "fr").as_deref(),
            Some("Je suis une théière")
        );
    }

    #[test]
    fn test_falls_back_to_default_text() {
        let resolver = resolver_with(vec![teapot()]);
        assert_eq!(resolver.resolve("teapot", "de").as_deref(), Some("I'm a teapot"));
    }

    #[test]
    fn test_region_stripped_fallback() {
        let resolver = resolver_with(vec![ErrorDefinition::new("gone", 410, "Gone")
            .with_translation("pt", "Removido")]);
        assert_eq!(resolver.resolve("gone", "pt-BR").as_deref(), Some("Removido"));
    }

    #[test]
    fn test_exact_region_beats_base() {
        let resolver = resolver_with(vec![ErrorDefinition::new("gone", 410, "Gone")
            .with_translation("pt", "Removido")
            .with_translation("pt-BR", "Sumiu")]);
        assert_eq!(resolver.resolve("gone", "pt-BR").as_deref(), Some("Sumiu"));
        assert_eq!(resolver.resolve("gone", "pt-PT").as_deref(), Some("Removido"));
    }

    #[test]
    fn test_empty_language_uses_default() {
        let catalog = Arc::new(DefinitionCatalog::new());
        catalog.register("teapot", teapot()).unwrap();
        let resolver = LocalizationResolver::with_default_language(catalog, "fr");

        assert_eq!(resolver.default_language(), "fr");
        assert_eq!(
            resolver.resolve("teapot", "").as_deref(),
            Some("Je suis une théière")
        );
    }

    #[test]
    fn test_unknown_key_not_cached() {
        let catalog = Arc::new(DefinitionCatalog::new());
        let resolver = LocalizationResolver::new(Arc::clone(&catalog));

        assert_eq!(resolver.resolve("teapot", "fr"), None);
        assert_eq!(resolver.cached_len(), 0);

        catalog.register("teapot", teapot()).unwrap();
        assert_eq!(
            resolver.resolve("teapot", "fr").as_deref(),
            Some("Je suis une théière")
        );
        assert_eq!(resolver.cached_len(), 1);
    }

    #[test]
    fn test_cache_pins_first_result() {
        let catalog = Arc::new(DefinitionCatalog::with_policy(RegistrationPolicy {
            reject_duplicates: false,
            ..RegistrationPolicy::default()
        }));
        catalog.register("teapot", teapot()).unwrap();
        let resolver = LocalizationResolver::new(Arc::clone(&catalog));

        let first = resolver.resolve("teapot", "fr");

        catalog
            .register(
                "teapot",
                ErrorDefinition::new("teapot", 418, "changed").with_translation("fr", "changé"),
            )
            .unwrap();

        assert_eq!(resolver.resolve("teapot", "fr"), first);

        resolver.clear_cache();
        assert_eq!(resolver.resolve("teapot", "fr").as_deref(), Some("changé"));
    }

    #[test]
    fn test_base_language() {
        assert_eq!(base_language("en-US"), Some("en"));
        assert_eq!(base_language("zh-Hant-TW"), Some("zh"));
        assert_eq!(base_language("en"), None);
        assert_eq!(base_language("-US"), None);
    }

    proptest! {
        #[test]
        fn prop_resolution_follows_fallback_chain(
            base in "[a-z]{2,3}",
            region in "[A-Z]{2}",
            with_exact in any::<bool>(),
            with_base in any::<bool>(),
        ) {
            let tag = format!("{base}-{region}");
            let mut def = ErrorDefinition::new("prop", 400, "default text");
            if with_exact {
                def = def.with_translation(tag.clone(), "exact text");
            }
            if with_base {
                def = def.with_translation(base.clone(), "base text");
            }
            let resolver = resolver_with(vec![def]);

            let expected = if with_exact {
                "exact text"
            } else if with_base {
                "base text"
            } else {
                "default text"
            };

            let first = resolver.resolve("prop", &tag);
            let cached = resolver.resolve("prop", &tag);
            prop_assert_eq!(first.as_deref(), Some(expected));
            prop_assert_eq!(cached.as_deref(), Some(expected));
        }
    }
}
