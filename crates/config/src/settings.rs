// Run settings
// Loaded from ./contactcheck.toml, then ~/.config/contactcheck/config.toml

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use contactcheck_eval::country::DEFAULT_PREFIXES;
use contactcheck_eval::{CountryPrefix, CountryPrefixTable};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "contactcheck.toml";

/// Loqate caps a batch email request at 100 addresses.
const MAX_EMAIL_CHUNK: usize = 100;

/// Upstream URLs. Overridable so tests and staging can point elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub email_batch: String,
    pub phone_individual: String,
    pub mailtm_base: String,
    /// Public SMS receiver listing currently active numbers.
    pub sms_active: String,
    /// Same site, numbers that no longer receive messages.
    pub sms_inactive: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            email_batch: "https://api.addressy.com/EmailValidation/Batch/Validate/v1.20/json3.ws".into(),
            phone_individual:
                "https://api.addressy.com/PhoneNumberValidation/Interactive/Validate/v2.20/json3.ws".into(),
            mailtm_base: "https://api.mail.tm".into(),
            sms_active: "https://receive-smss.com/".into(),
            sms_inactive: "https://receive-smss.com/inactive-numbers/".into(),
        }
    }
}

/// Persisted input lists under the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetFile {
    StandardEmails,
    ProEmails,
    RealScrapedPhones,
    InactiveScrapedPhones,
    FakePhones,
}

impl DatasetFile {
    pub const ALL: [DatasetFile; 5] = [
        Self::StandardEmails,
        Self::ProEmails,
        Self::RealScrapedPhones,
        Self::InactiveScrapedPhones,
        Self::FakePhones,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::StandardEmails => "input_standard_emails.json",
            Self::ProEmails => "input_pro_emails.json",
            Self::RealScrapedPhones => "input_real_scraped_phones.json",
            Self::InactiveScrapedPhones => "input_inactive_scraped_phones.json",
            Self::FakePhones => "input_fake_phones.json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Generated inputs and verification results.
    pub data_dir: PathBuf,

    /// Per-run log files.
    pub logs_dir: PathBuf,

    /// Addresses per batch email request (1-100).
    pub email_chunk_size: usize,

    /// Timeout for every outbound HTTP request.
    pub http_timeout_secs: u64,

    pub endpoints: Endpoints,

    /// Country code → dialing prefix, in reporting order.
    pub countries: Vec<CountryPrefix>,

    /// Directory relative paths resolve against (the config file's directory).
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            logs_dir: PathBuf::from("logs"),
            email_chunk_size: MAX_EMAIL_CHUNK,
            http_timeout_secs: 15,
            endpoints: Endpoints::default(),
            countries: DEFAULT_PREFIXES
                .iter()
                .map(|(code, prefix)| CountryPrefix::new(*code, *prefix))
                .collect(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Per-user config file location.
    pub fn user_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("contactcheck")
            .join("config.toml")
    }

    /// Load settings.
    ///
    /// An explicit path must exist. Otherwise `./contactcheck.toml` is tried,
    /// then the per-user file, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            return Self::from_file(path);
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::from_file(&local);
        }

        let user = Self::user_config_path();
        if user.exists() {
            return Self::from_file(&user);
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let mut settings = Self::from_toml(&contents)?;
        settings.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.email_chunk_size == 0 || self.email_chunk_size > MAX_EMAIL_CHUNK {
            return Err(ConfigError::Validation(format!(
                "email_chunk_size must be between 1 and {MAX_EMAIL_CHUNK}, got {}",
                self.email_chunk_size
            )));
        }

        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Validation("http_timeout_secs must be positive".into()));
        }

        if self.countries.is_empty() {
            return Err(ConfigError::Validation("at least one country is required".into()));
        }

        let mut seen = HashSet::new();
        for entry in &self.countries {
            if entry.code.trim().is_empty() {
                return Err(ConfigError::Validation("country code must not be empty".into()));
            }
            if !seen.insert(entry.code.as_str()) {
                return Err(ConfigError::DuplicateCountry(entry.code.clone()));
            }
            let digits = entry.prefix.strip_prefix('+').unwrap_or("");
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::Validation(format!(
                    "country '{}': prefix must be '+' followed by digits, got '{}'",
                    entry.code, entry.prefix
                )));
            }
        }

        Ok(())
    }

    pub fn prefix_table(&self) -> CountryPrefixTable {
        CountryPrefixTable::new(self.countries.clone())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join(&self.data_dir)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join(&self.logs_dir)
    }

    /// The `.env` file read at startup, next to the config file in use.
    pub fn dotenv_path(&self) -> PathBuf {
        self.base_dir.join(".env")
    }

    pub fn dataset_path(&self, file: DatasetFile) -> PathBuf {
        self.data_dir().join(file.file_name())
    }

    /// Results path without extension; `.json` and `.csv` are written next to it.
    pub fn results_stem(&self) -> PathBuf {
        self.data_dir().join("verification_results")
    }

    pub fn log_path(&self, timestamp: &str) -> PathBuf {
        self.logs_dir().join(format!("contactcheck_run_{timestamp}.log"))
    }
}
