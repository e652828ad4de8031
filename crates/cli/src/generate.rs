//! Synthetic test inputs.
//!
//! Standard fakes are made-up addresses on reserved example domains. Pro fakes are
//! live disposable mailboxes. Phones per country come from the scraped
//! listings first and fall back to structured fakes.

use std::collections::VecDeque;
use std::time::Duration;

use contactcheck_config::Settings;
use contactcheck_eval::scope::PhonesByCountry;
use contactcheck_eval::CountryPrefixTable;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::dataset::Dataset;
use crate::fetch::{MailTmClient, SmsScraper};
use crate::CliError;

const FIRST_NAMES: &[&str] = &[
    "james", "mary", "robert", "patricia", "john", "jennifer", "michael", "linda", "david",
    "elizabeth", "william", "barbara", "richard", "susan", "joseph", "jessica", "thomas", "sarah",
    "charles", "karen", "daniel", "nancy", "matthew", "lisa", "anthony", "betty", "mark", "sandra",
];

const LAST_NAMES: &[&str] = &[
    "smith", "johnson", "williams", "brown", "jones", "garcia", "miller", "davis", "rodriguez",
    "martinez", "hernandez", "lopez", "gonzalez", "wilson", "anderson", "taylor", "moore",
    "jackson", "martin", "lee", "thompson", "white", "harris", "clark", "lewis", "walker",
];

/// Reserved for documentation (RFC 2606); no mailbox can exist on them.
const SAFE_DOMAINS: &[&str] = &["example.com", "example.net", "example.org"];

/// Length of the national part of a structured fake.
const NATIONAL_DIGITS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateCounts {
    pub standard: usize,
    pub pro: usize,
    pub phones_per_country: usize,
}

// ── Emails ──────────────────────────────────────────────────────────

/// A plausible personal address that nobody owns.
pub fn fake_email<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("user");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("name");
    let domain = SAFE_DOMAINS.choose(rng).copied().unwrap_or("example.com");
    match rng.gen_range(0..3) {
        0 => format!("{first}.{last}@{domain}"),
        1 => format!("{first}{last}{}@{domain}", rng.gen_range(1..100)),
        _ => format!("{}{last}@{domain}", &first[..1]),
    }
}

// ── Phones ──────────────────────────────────────────────────────────

/// `prefix` followed by random national digits. The first digit is never
/// a trunk zero.
pub fn structured_fake_phone<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    let mut phone = String::with_capacity(prefix.len() + NATIONAL_DIGITS);
    phone.push_str(prefix);
    phone.push(char::from(b'0' + rng.gen_range(1..=9u8)));
    for _ in 1..NATIONAL_DIGITS {
        phone.push(char::from(b'0' + rng.gen_range(0..=9u8)));
    }
    phone
}

/// Fill `per_country` numbers for every country in table order: active
/// scraped, then inactive scraped, then structured fakes.
pub fn allocate_phones<R: Rng + ?Sized>(
    table: &CountryPrefixTable,
    per_country: usize,
    active: PhonesByCountry,
    inactive: PhonesByCountry,
    rng: &mut R,
) -> (PhonesByCountry, PhonesByCountry, PhonesByCountry) {
    let mut active = into_queues(active);
    let mut inactive = into_queues(inactive);

    let mut scraped_active = PhonesByCountry::new();
    let mut scraped_inactive = PhonesByCountry::new();
    let mut fakes = PhonesByCountry::new();

    for entry in table.entries() {
        let code = entry.code.as_str();
        for _ in 0..per_country {
            if let Some(number) = active.get_mut(code).and_then(VecDeque::pop_front) {
                tracing::info!("   [{}] Using scraped real active number: {}", code, number);
                scraped_active.entry(code.to_string()).or_default().push(number);
            } else if let Some(number) = inactive.get_mut(code).and_then(VecDeque::pop_front) {
                tracing::info!("   [{}] Using scraped real inactive number: {}", code, number);
                scraped_inactive.entry(code.to_string()).or_default().push(number);
            } else {
                let number = structured_fake_phone(&entry.prefix, rng);
                tracing::info!("   [{}] Using structured fake number: {}", code, number);
                fakes.entry(code.to_string()).or_default().push(number);
            }
        }
    }

    (scraped_active, scraped_inactive, fakes)
}

fn into_queues(map: PhonesByCountry) -> std::collections::BTreeMap<String, VecDeque<String>> {
    map.into_iter().map(|(k, v)| (k, VecDeque::from(v))).collect()
}

// ── Dataset ─────────────────────────────────────────────────────────

/// Build a dataset from already-fetched listings and a pro-email source.
pub fn build_dataset<R, F>(
    table: &CountryPrefixTable,
    counts: GenerateCounts,
    active: PhonesByCountry,
    inactive: PhonesByCountry,
    mut pro_email: F,
    rng: &mut R,
) -> Dataset
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> Option<String>,
{
    tracing::info!(
        "--- Generating Data: {} Std Email, {} Pro Email, {} Phones/Country ---",
        counts.standard,
        counts.pro,
        counts.phones_per_country,
    );

    let standard_emails = (0..counts.standard).map(|_| fake_email(rng)).collect();
    let pro_emails = (0..counts.pro).filter_map(|_| pro_email(rng)).collect();
    let (scraped_active, scraped_inactive, fake_phones) =
        allocate_phones(table, counts.phones_per_country, active, inactive, rng);

    Dataset {
        standard_emails,
        pro_emails,
        scraped_active,
        scraped_inactive,
        fake_phones,
    }
}

/// Generate a dataset against the live mail.tm and SMS listing endpoints.
pub fn generate_dataset<R: Rng + ?Sized>(
    settings: &Settings,
    counts: GenerateCounts,
    rng: &mut R,
) -> Result<Dataset, CliError> {
    let table = settings.prefix_table();
    let timeout = Duration::from_secs(settings.http_timeout_secs);
    let mailtm = MailTmClient::new(settings.endpoints.mailtm_base.clone(), timeout)?;

    let (active, inactive) = if counts.phones_per_country > 0 {
        let scraper = SmsScraper::new(
            settings.endpoints.sms_active.clone(),
            settings.endpoints.sms_inactive.clone(),
            timeout,
        )?;
        let active = scraper.active(&table);
        let inactive = scraper.inactive(&table);
        (active, inactive)
    } else {
        (PhonesByCountry::new(), PhonesByCountry::new())
    };

    let dataset = build_dataset(&table, counts, active, inactive, |rng| mailtm.create_address(rng), rng);
    if dataset.pro_emails.len() < counts.pro {
        tracing::warn!(
            "only {} of {} pro emails could be created",
            dataset.pro_emails.len(),
            counts.pro,
        );
    }
    Ok(dataset)
}
