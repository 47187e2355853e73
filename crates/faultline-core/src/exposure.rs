//! What a redacted error is allowed to reveal.

use crate::error::GENERIC_MESSAGE;
use serde::{Deserialize, Serialize};

/// Whether error metadata reaches the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaVisibility {
    /// Metadata is serialized even when the error itself is redacted.
    #[default]
    Always,
    /// Metadata is serialized only for exposed errors.
    ExposedOnly,
}

impl MetaVisibility {
    /// Returns `true` if metadata should be written for an error with the
    /// given exposure.
    #[must_use]
    pub const fn allows(self, exposed: bool) -> bool {
        match self {
            Self::Always => true,
            Self::ExposedOnly => exposed,
        }
    }
}

/// Rendering rules for errors that are not exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposurePolicy {
    /// Message substituted for a redacted error's text.
    pub generic_message: String,
    /// Metadata visibility.
    pub meta: MetaVisibility,
}

impl Default for ExposurePolicy {
    fn default() -> Self {
        Self {
            generic_message: GENERIC_MESSAGE.to_string(),
            meta: MetaVisibility::default(),
        }
    }
}
