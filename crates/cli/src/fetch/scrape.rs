//! Phone numbers from a public SMS-receiver site.
//!
//! The "active" listing gives numbers that are live right now (ground truth
//! Real); the "inactive" listing gives numbers that existed but no longer
//! receive messages (treated as Fake).

use std::sync::OnceLock;
use std::time::Duration;

use contactcheck_eval::scope::PhonesByCountry;
use contactcheck_eval::{detect_country, CountryPrefixTable};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::CliError;

use super::common::FetchClient;

/// Desktop Chrome headers; the site answers 403 to obvious bots.
const BROWSER_HEADERS: [(&str, &str); 9] = [
    ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"),
    ("accept-language", "en-US,en;q=0.9"),
    ("referer", "https://www.google.com/"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
];

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\+([0-9][0-9\s]{7,16})").expect("valid regex"))
}

/// Every `+` followed by 8-17 digits/spaces, with separators removed.
pub fn extract_numbers(text: &str) -> Vec<String> {
    number_pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            let digits: String = m
                .as_str()
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .collect();
            format!("+{digits}")
        })
        .collect()
}

/// Bucket numbers by country, first occurrence kept. Numbers that match no
/// prefix are dropped.
pub fn bucket_numbers(table: &CountryPrefixTable, numbers: &[String]) -> (PhonesByCountry, usize) {
    let mut buckets = PhonesByCountry::new();
    let mut added = 0;
    for number in numbers {
        let Some(code) = detect_country(table, number).and_then(|m| m.code()) else {
            continue;
        };
        let bucket = buckets.entry(code.to_string()).or_default();
        if !bucket.contains(number) {
            bucket.push(number.clone());
            added += 1;
        }
    }
    (buckets, added)
}

// ── Scraper ─────────────────────────────────────────────────────────

pub struct SmsScraper {
    client: FetchClient,
    active_url: String,
    inactive_url: String,
}

impl SmsScraper {
    pub fn new(active_url: String, inactive_url: String, timeout: Duration) -> Result<Self, CliError> {
        let mut headers = HeaderMap::new();
        for (name, value) in BROWSER_HEADERS {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }

        Ok(Self {
            client: FetchClient::with_headers("SMS listing", timeout, headers, |_, status| {
                format!("HTTP {status}")
            })?,
            active_url,
            inactive_url,
        })
    }

    pub fn active(&self, table: &CountryPrefixTable) -> PhonesByCountry {
        self.scrape(&self.active_url, table)
    }

    pub fn inactive(&self, table: &CountryPrefixTable) -> PhonesByCountry {
        self.scrape(&self.inactive_url, table)
    }

    /// Fetch one listing. Failures are warnings and give an empty map.
    fn scrape(&self, url: &str, table: &CountryPrefixTable) -> PhonesByCountry {
        tracing::info!("--- Fetching Numbers from {} ---", url);
        let page = match self.client.request_with_retry_text(|http| http.get(url)) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("   [Warning] Error scraping {}: {}", url, e.message);
                return PhonesByCountry::new();
            }
        };

        let (buckets, added) = bucket_numbers(table, &extract_numbers(&page));
        tracing::info!("   [Success] Found {} numbers from this source.", added);
        buckets
    }
}

// ── Tests ───────────────────────────────────────────────────────────
