//! Process execution mode.
//!
//! The execution mode is the single switch that makes Faultline permissive:
//! in [`ExecutionMode::Development`] catalog registration faults fail fast and
//! every error's true key and message reach the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variable that carries the execution mode signal.
pub const APP_ENV_VAR: &str = "APP_ENV";

/// How strictly the process treats catalog faults and error exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Production behaviour: warn on catalog faults, honour per-kind `expose`.
    #[default]
    Production,
    /// Development behaviour: fail fast on catalog faults, expose everything.
    Development,
}

impl ExecutionMode {
    /// Reads the mode from the `APP_ENV` environment variable.
    ///
    /// Any value containing `dev` (case-insensitive) selects development,
    /// everything else (including an unset variable) selects production.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(APP_ENV_VAR)
            .map(|value| Self::from_signal(&value))
            .unwrap_or_default()
    }

    /// Interprets a free-form environment name such as `dev`, `development`
    /// or `prod`.
    #[must_use]
    pub fn from_signal(value: &str) -> Self {
        if value.to_ascii_lowercase().contains("dev") {
            Self::Development
        } else {
            Self::Production
        }
    }

    /// Returns `true` if catalog faults must abort instead of warn.
    #[must_use]
    pub const fn is_strict(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns `true` if true error detail is exposed regardless of policy.
    #[must_use]
    pub const fn is_permissive(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_signal(s))
    }
}
