//! Error definitions and the definition catalog.
//!
//! The [`DefinitionCatalog`] holds one [`ErrorDefinition`] per known error
//! kind. It is built once at startup and shared by reference with every
//! component that needs it.
//!
//! # Registration faults
//!
//! Two faults can happen while registering:
//!
//! | Fault | Production | Development |
//! |---|---|---|
//! | duplicate key (rejection on) | warn, keep original | [`CatalogError::DuplicateKey`] |
//! | malformed key (relaxed off) | warn, insert anyway | [`CatalogError::InvalidKey`] |
//!
//! Re-registering an identical definition is always a silent no-op.

use crate::mode::ExecutionMode;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Static description of one known error kind.
///
/// # Example
///
/// ```
/// use faultline_core::ErrorDefinition;
///
/// let def = ErrorDefinition::new("teapot", 418, "I'm a teapot")
///     .with_translation("fr", "Je suis une théière")
///     .exposed();
///
/// assert_eq!(def.translation("fr"), Some("Je suis une théière"));
/// assert!(def.expose);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDefinition {
    /// Stable identifier of the error kind.
    pub key: String,

    /// HTTP status code.
    pub code: u16,

    /// Fallback text used when no translation matches.
    #[serde(rename = "default")]
    pub default_text: String,

    /// Language tag to localized text.
    #[serde(default)]
    pub i18n: HashMap<String, String>,

    /// Whether the true key and message may reach the caller.
    #[serde(default)]
    pub expose: bool,

    /// Optional secondary classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_code: Option<String>,

    /// Optional category tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl ErrorDefinition {
    /// Creates a definition that is not exposed and has no translations.
    #[must_use]
    pub fn new(key: impl Into<String>, code: u16, default_text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code,
            default_text: default_text.into(),
            i18n: HashMap::new(),
            expose: false,
            internal_code: None,
            group: None,
        }
    }

    /// Adds a translation for a language tag.
    #[must_use]
    pub fn with_translation(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.i18n.insert(language.into(), text.into());
        self
    }

    /// Marks the definition as exposed to callers.
    #[must_use]
    pub fn exposed(mut self) -> Self {
        self.expose = true;
        self
    }

    /// Sets the internal classification code.
    #[must_use]
    pub fn with_internal_code(mut self, internal_code: impl Into<String>) -> Self {
        self.internal_code = Some(internal_code.into());
        self
    }

    /// Sets the group tag.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Returns the translation for an exact language tag.
    #[must_use]
    pub fn translation(&self, language: &str) -> Option<&str> {
        self.i18n.get(language).map(String::as_str)
    }
}

/// Errors raised by strict catalog registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The key is already registered with a different definition.
    #[error("duplicate error key: {key}")]
    DuplicateKey {
        /// The conflicting key.
        key: String,
    },

    /// The key does not match `^[a-z0-9_.-]+$`.
    #[error("invalid error key format: {key}")]
    InvalidKey {
        /// The malformed key.
        key: String,
    },
}

/// What a successful [`DefinitionCatalog::register`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The key was new and the definition was stored.
    Inserted,
    /// The key existed and duplicates are allowed; the definition was replaced.
    Replaced,
    /// The key existed with an identical definition; nothing changed.
    Unchanged,
    /// The key existed and duplicate rejection kept the original.
    Skipped,
}

/// Registration rules for a [`DefinitionCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationPolicy {
    /// Reject a second definition for an existing key.
    pub reject_duplicates: bool,

    /// Tolerate keys outside the `[a-z0-9_.-]` charset without complaint.
    pub relaxed_key_format: bool,

    /// Turn registration faults into errors instead of warnings.
    pub strict: bool,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            reject_duplicates: true,
            relaxed_key_format: true,
            strict: false,
        }
    }
}

impl RegistrationPolicy {
    /// Returns the default policy with strictness derived from the mode.
    #[must_use]
    pub fn for_mode(mode: ExecutionMode) -> Self {
        Self {
            strict: mode.is_strict(),
            ..Self::default()
        }
    }
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9_.\-]+$").expect("valid key pattern"))
}

/// Returns `true` if `key` only uses lowercase letters, digits, `.`, `_` or `-`.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    key_pattern().is_match(key)
}

/// Thread-safe catalog of error definitions.
///
/// Lookups take a shared lock and never block each other; registration
/// takes the exclusive lock.
///
/// # Example
///
/// ```
/// use faultline_core::{DefinitionCatalog, ErrorDefinition, Registration};
///
/// let catalog = DefinitionCatalog::new();
/// let outcome = catalog
///     .register("user_not_found", ErrorDefinition::new("user_not_found", 404, "User not found"))
///     .unwrap();
///
/// assert_eq!(outcome, Registration::Inserted);
/// assert_eq!(catalog.lookup("user_not_found").unwrap().code, 404);
/// ```
#[derive(Debug, Default)]
pub struct DefinitionCatalog {
    entries: RwLock<HashMap<String, ErrorDefinition>>,
    policy: RegistrationPolicy,
}

impl DefinitionCatalog {
    /// Creates an empty catalog with the default (production) policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty catalog with the given policy.
    #[must_use]
    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// Returns the registration policy.
    #[must_use]
    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Registers a definition under `key`.
    ///
    /// # Errors
    ///
    /// Only in strict mode: [`CatalogError::DuplicateKey`] when the key is
    /// taken by a different definition and duplicates are rejected, or
    /// [`CatalogError::InvalidKey`] when the key is malformed and the key
    /// format is not relaxed.
    pub fn register(
        &self,
        key: impl Into<String>,
        definition: ErrorDefinition,
    ) -> Result<Registration, CatalogError> {
        let key = key.into();
        let mut entries = self.entries.write();

        let existing = entries.get(&key);
        if existing == Some(&definition) {
            return Ok(Registration::Unchanged);
        }

        if existing.is_some() && self.policy.reject_duplicates {
            if self.policy.strict {
                return Err(CatalogError::DuplicateKey { key });
            }
            tracing::warn!(error_key = %key, "duplicate error key ignored");
            return Ok(Registration::Skipped);
        }

        if !self.policy.relaxed_key_format && !is_valid_key(&key) {
            if self.policy.strict {
                return Err(CatalogError::InvalidKey { key });
            }
            tracing::warn!(error_key = %key, "invalid error key format");
        }

        let replaced = entries.insert(key, definition).is_some();
        Ok(if replaced {
            Registration::Replaced
        } else {
            Registration::Inserted
        })
    }

    /// Registers every definition under its own key, stopping at the first
    /// strict-mode failure.
    pub fn register_all<I>(&self, definitions: I) -> Result<usize, CatalogError>
    where
        I: IntoIterator<Item = ErrorDefinition>,
    {
        let mut inserted = 0;
        for definition in definitions {
            let key = definition.key.clone();
            if matches!(
                self.register(key, definition)?,
                Registration::Inserted | Registration::Replaced
            ) {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Looks up the definition for `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<ErrorDefinition> {
        self.entries.read().get(key).cloned()
    }

    /// Returns whether a definition exists for `key` and is exposed.
    #[must_use]
    pub fn is_exposed(&self, key: &str) -> bool {
        self.entries.read().get(key).is_some_and(|def| def.expose)
    }

    /// Returns `true` if `key` is registered.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Returns the number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns all registered keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}
