use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    Parse(String),
    /// Settings parsed but are unusable (bad prefix, zero chunk size, ...).
    Validation(String),
    /// A country code appears twice in the prefix table.
    DuplicateCountry(String),
    /// Config file named explicitly but missing.
    NotFound(String),
    /// IO error reading the config or `.env` file.
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
            Self::DuplicateCountry(code) => write!(f, "country '{code}' listed more than once"),
            Self::NotFound(path) => write!(f, "config file not found: {path}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
