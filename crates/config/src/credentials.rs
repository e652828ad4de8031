// API key and operator-supplied ground truth
//
// Both come from the process environment, optionally seeded from a `.env`
// file next to the working directory. Neither is ever written to the
// settings file.

use std::env;
use std::path::Path;

use crate::error::ConfigError;

pub const API_KEY_ENV: &str = "LOQATE_API_KEY";
pub const REAL_EMAILS_ENV: &str = "REAL_EMAILS";
pub const REAL_PHONES_ENV: &str = "REAL_PHONES";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Passed on the command line
    Flag,
    /// Read from `LOQATE_API_KEY` (possibly via `.env`)
    Environment,
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Flag => "flag",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

/// Load the `.env` file at `path` if present. Existing variables win.
///
/// Returns whether a file was loaded.
pub fn load_dotenv(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }
    dotenvy::from_path(path).map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), "loaded environment file");
    Ok(true)
}

/// Get the Loqate API key
///
/// Checks in order:
/// 1. Command-line flag (blank counts as missing)
/// 2. `LOQATE_API_KEY`
pub fn get_api_key(flag: Option<&str>) -> KeyLookup {
    if let Some(key) = flag {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return KeyLookup {
                key: None,
                source: KeySource::None,
            };
        }
        return KeyLookup {
            key: Some(trimmed.to_string()),
            source: KeySource::Flag,
        };
    }

    if let Ok(key) = env::var(API_KEY_ENV) {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return KeyLookup {
                key: Some(trimmed.to_string()),
                source: KeySource::Environment,
            };
        }
    }

    KeyLookup {
        key: None,
        source: KeySource::None,
    }
}

/// Inputs the operator knows to be real and reachable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealInputs {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

/// Read `REAL_EMAILS` / `REAL_PHONES` (comma-separated).
pub fn real_inputs_from_env() -> RealInputs {
    RealInputs {
        emails: parse_list(&env::var(REAL_EMAILS_ENV).unwrap_or_default()),
        phones: parse_list(&env::var(REAL_PHONES_ENV).unwrap_or_default()),
    }
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
