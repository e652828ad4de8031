//! Generated inputs on disk: two email lists and three per-country phone maps.

use std::fs;
use std::path::{Path, PathBuf};

use contactcheck_config::{DatasetFile, RealInputs, Settings};
use contactcheck_eval::scope::PhonesByCountry;
use contactcheck_eval::ScopeInputs;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::CliError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub standard_emails: Vec<String>,
    pub pro_emails: Vec<String>,
    /// Active listing numbers (Real).
    pub scraped_active: PhonesByCountry,
    /// Inactive listing numbers (Fake).
    pub scraped_inactive: PhonesByCountry,
    /// Structured fake numbers (Fake).
    pub fake_phones: PhonesByCountry,
}

impl Dataset {
    pub fn email_count(&self) -> usize {
        self.standard_emails.len() + self.pro_emails.len()
    }

    pub fn phone_count(&self) -> usize {
        count_phones(&self.scraped_active)
            + count_phones(&self.scraped_inactive)
            + count_phones(&self.fake_phones)
    }

    /// Write every non-empty list under the data dir. Empty lists leave any
    /// previous file in place.
    pub fn save(&self, settings: &Settings) -> Result<Vec<PathBuf>, CliError> {
        let dir = settings.data_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| CliError::io(format!("cannot create {}: {e}", dir.display())))?;

        let mut written = Vec::new();
        for file in DatasetFile::ALL {
            let count = match file {
                DatasetFile::StandardEmails => self.standard_emails.len(),
                DatasetFile::ProEmails => self.pro_emails.len(),
                DatasetFile::RealScrapedPhones => count_phones(&self.scraped_active),
                DatasetFile::InactiveScrapedPhones => count_phones(&self.scraped_inactive),
                DatasetFile::FakePhones => count_phones(&self.fake_phones),
            };
            if count == 0 {
                continue;
            }

            let path = settings.dataset_path(file);
            match file {
                DatasetFile::StandardEmails => write_json(&path, &self.standard_emails)?,
                DatasetFile::ProEmails => write_json(&path, &self.pro_emails)?,
                DatasetFile::RealScrapedPhones => write_json(&path, &self.scraped_active)?,
                DatasetFile::InactiveScrapedPhones => write_json(&path, &self.scraped_inactive)?,
                DatasetFile::FakePhones => write_json(&path, &self.fake_phones)?,
            }
            tracing::info!("[File] Saved {} items to {}", count, path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// Read the five files from the data dir. Missing files are empty.
    pub fn load(settings: &Settings) -> Result<Self, CliError> {
        let path = |file: DatasetFile| settings.dataset_path(file);
        Ok(Self {
            standard_emails: load_json(&path(DatasetFile::StandardEmails))?,
            pro_emails: load_json(&path(DatasetFile::ProEmails))?,
            scraped_active: load_json(&path(DatasetFile::RealScrapedPhones))?,
            scraped_inactive: load_json(&path(DatasetFile::InactiveScrapedPhones))?,
            fake_phones: load_json(&path(DatasetFile::FakePhones))?,
        })
    }

    /// Combine with the operator's real inputs into the evaluator's view.
    pub fn into_scope_inputs(self, real: RealInputs) -> ScopeInputs {
        ScopeInputs {
            real_emails: real.emails,
            real_phones: real.phones,
            standard_emails: self.standard_emails,
            pro_emails: self.pro_emails,
            scraped_active: self.scraped_active,
            scraped_inactive: self.scraped_inactive,
            generated_phones: self.fake_phones,
        }
    }
}

fn count_phones(map: &PhonesByCountry) -> usize {
    map.values().map(Vec::len).sum()
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("JSON error: {e}")))?;
    fs::write(path, json)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
}

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, CliError> {
    if !path.exists() {
        tracing::warn!("[Warning] File not found: {}. Using empty data.", path.display());
        return Ok(T::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| {
        CliError::parse(format!("{}: {e}", path.display()))
            .with_hint("regenerate the dataset with --generate-new-data")
    })
}
