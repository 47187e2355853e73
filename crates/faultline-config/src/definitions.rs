//! Loading error definitions from YAML.
//!
//! The file is a list of records:
//!
//! ```yaml
//! - key: teapot
//!   code: 418
//!   default: "I'm a teapot"
//!   expose: true
//!   i18n:
//!     fr: "Je suis une théière"
//! ```
//!
//! Every record needs a non-empty `key`, a non-zero `code` and a non-empty
//! `default`. The first record that breaks this aborts the load.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use faultline_core::{DefinitionCatalog, ErrorDefinition};
use serde::Deserialize;

use crate::DefinitionError;

/// As read from the file, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDefinition {
    key: String,
    code: u64,
    default: String,
    i18n: HashMap<String, String>,
    expose: bool,
    internal_code: Option<String>,
    group: Option<String>,
}

impl RawDefinition {
    fn validate(self, index: usize) -> Result<ErrorDefinition, DefinitionError> {
        if self.key.is_empty() {
            return Err(DefinitionError::invalid_definition(
                index,
                self.key,
                "key must not be empty",
            ));
        }
        if self.code == 0 {
            return Err(DefinitionError::invalid_definition(
                index,
                self.key,
                "code must be non-zero",
            ));
        }
        let Ok(code) = u16::try_from(self.code) else {
            return Err(DefinitionError::invalid_definition(
                index,
                self.key,
                format!("code {} is out of range", self.code),
            ));
        };
        if self.default.is_empty() {
            return Err(DefinitionError::invalid_definition(
                index,
                self.key,
                "default text must not be empty",
            ));
        }

        Ok(ErrorDefinition {
            key: self.key,
            code,
            default_text: self.default,
            i18n: self.i18n,
            expose: self.expose,
            internal_code: self.internal_code,
            group: self.group,
        })
    }
}

/// A validated list of error definitions.
///
/// # Example
///
/// ```
/// use faultline_config::DefinitionLoader;
/// use faultline_core::DefinitionCatalog;
///
/// let loader: DefinitionLoader = r#"
/// - key: teapot
///   code: 418
///   default: "I'm a teapot"
///   i18n:
///     fr: "Je suis une théière"
/// "#
/// .parse()
/// .unwrap();
///
/// let catalog = DefinitionCatalog::new();
/// assert_eq!(loader.load_into(&catalog).unwrap(), 1);
/// assert_eq!(catalog.lookup("teapot").unwrap().code, 418);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefinitionLoader {
    definitions: Vec<ErrorDefinition>,
}

impl DefinitionLoader {
    /// Reads and validates definitions from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError` if the file is missing or unreadable, is not
    /// a YAML list, or contains an invalid record.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DefinitionError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DefinitionError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| DefinitionError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let loader: Self = content.parse()?;
        tracing::debug!(
            path = %path.display(),
            count = loader.len(),
            "error definitions read"
        );
        Ok(loader)
    }

    /// Returns the validated definitions in file order.
    #[must_use]
    pub fn definitions(&self) -> &[ErrorDefinition] {
        &self.definitions
    }

    /// Returns the number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if the file held no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Consumes the loader, returning its definitions.
    #[must_use]
    pub fn into_definitions(self) -> Vec<ErrorDefinition> {
        self.definitions
    }

    /// Registers every definition in file order.
    ///
    /// Returns how many were inserted or replaced. Duplicates are handled by
    /// the catalog's policy.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::Catalog`] when a strict catalog refuses a
    /// definition. Definitions before it stay registered.
    pub fn load_into(&self, catalog: &DefinitionCatalog) -> Result<usize, DefinitionError> {
        let inserted = catalog.register_all(self.definitions.iter().cloned())?;
        tracing::info!(
            inserted,
            total = catalog.len(),
            "error definitions registered"
        );
        Ok(inserted)
    }
}

impl FromStr for DefinitionLoader {
    type Err = DefinitionError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: Vec<RawDefinition> = serde_yaml::from_str(content)?;

        let definitions = raw
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.validate(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { definitions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::{CatalogError, RegistrationPolicy};
    use std::io::Write;

    const TEAPOT: &str = r#"
- key: teapot
  code: 418
  default: "I'm a teapot"
  expose: true
  group: fun
  i18n:
    en: "I'm a teapot"
    fr: "Je suis une théière"
- key: user_not_found
  code: 404
  default: User not found
  internal_code: USR-404
"#;

    fn invalid_reason(content: &str) -> (usize, String) {
        match content.parse::<DefinitionLoader>() {
            Err(DefinitionError::InvalidDefinition { index, reason, .. }) => (index, reason),
            other => panic!("expected invalid definition, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_definitions() {
        let loader: DefinitionLoader = TEAPOT.parse().unwrap();
        assert_eq!(loader.len(), 2);

        let teapot = &loader.definitions()[0];
        assert_eq!(teapot.key, "teapot");
        assert_eq!(teapot.code, 418);
        assert!(teapot.expose);
        assert_eq!(teapot.group.as_deref(), Some("fun"));
        assert_eq!(teapot.translation("fr"), Some("Je suis une théière"));

        let missing = &loader.definitions()[1];
        assert!(!missing.expose);
        assert!(missing.i18n.is_empty());
        assert_eq!(missing.internal_code.as_deref(), Some("USR-404"));
    }

    #[test]
    fn test_empty_document() {
        let loader: DefinitionLoader = "".parse().unwrap();
        assert!(loader.is_empty());
    }

    #[test]
    fn test_missing_key_rejected() {
        let (index, reason) = invalid_reason("- code: 400\n  default: Bad\n");
        assert_eq!(index, 0);
        assert!(reason.contains("key"));
    }

    #[test]
    fn test_zero_code_rejected() {
        let (index, reason) =
            invalid_reason("- key: ok\n  code: 400\n  default: Ok\n- key: bad\n  code: 0\n  default: Bad\n");
        assert_eq!(index, 1);
        assert!(reason.contains("non-zero"));
    }

    #[test]
    fn test_out_of_range_code_rejected() {
        let (_, reason) = invalid_reason("- key: big\n  code: 70000\n  default: Big\n");
        assert!(reason.contains("out of range"));
    }

    #[test]
    fn test_empty_default_rejected() {
        let (_, reason) = invalid_reason("- key: blank\n  code: 400\n  default: \"\"\n");
        assert!(reason.contains("default"));
    }

    #[test]
    fn test_not_a_list() {
        let result = "key: teapot".parse::<DefinitionLoader>();
        assert!(matches!(result, Err(DefinitionError::Parse(_))));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TEAPOT.as_bytes()).unwrap();

        let loader = DefinitionLoader::from_path(file.path()).unwrap();
        assert_eq!(loader.len(), 2);
    }

    #[test]
    fn test_from_path_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = DefinitionLoader::from_path(dir.path().join("errors.yaml"));
        assert!(matches!(result, Err(DefinitionError::FileNotFound { .. })));
    }

    #[test]
    fn test_load_into_preserves_order_and_first_duplicate() {
        let content = format!(
            "{TEAPOT}- key: teapot\n  code: 500\n  default: Not a teapot\n"
        );
        let loader: DefinitionLoader = content.parse().unwrap();
        let catalog = DefinitionCatalog::new();

        assert_eq!(loader.load_into(&catalog).unwrap(), 2);
        assert_eq!(catalog.lookup("teapot").unwrap().code, 418);
    }

    #[test]
    fn test_load_into_strict_catalog_fails() {
        let content = format!(
            "{TEAPOT}- key: teapot\n  code: 500\n  default: Not a teapot\n"
        );
        let loader: DefinitionLoader = content.parse().unwrap();
        let catalog = DefinitionCatalog::with_policy(RegistrationPolicy {
            strict: true,
            ..RegistrationPolicy::default()
        });

        let err = loader.load_into(&catalog).unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::Catalog(CatalogError::DuplicateKey { ref key }) if key == "teapot"
        ));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_into_definitions() {
        let loader: DefinitionLoader = TEAPOT.parse().unwrap();
        let keys: Vec<_> = loader.into_definitions().into_iter().map(|d| d.key).collect();
        assert_eq!(keys, vec!["teapot", "user_not_found"]);
    }
}
