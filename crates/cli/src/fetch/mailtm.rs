//! mail.tm disposable mailboxes, used as "pro" fake emails.
//!
//! A mailbox is created for real so the address exists on a live domain,
//! which is exactly what makes it a harder case for the validator.

use std::thread;
use std::time::Duration;

use rand::distributions::{Alphanumeric, DistString};
use rand::Rng;
use serde_json::{json, Value};

use crate::CliError;

use super::common::FetchClient;

// ── Constants ───────────────────────────────────────────────────────

const MAX_ATTEMPTS: u32 = 3;
const LOCAL_PART_LEN: usize = 10;
const PASSWORD_LEN: usize = 16;
const LOCAL_PART_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Sleeps between attempts.
#[derive(Debug, Clone)]
pub struct Pauses {
    /// After a failed request or an unusable response.
    pub failure: Duration,
    /// Bounds (seconds) of the random wait after a 429.
    pub rate_limited: (f64, f64),
}

impl Default for Pauses {
    fn default() -> Self {
        Self {
            failure: Duration::from_secs(1),
            rate_limited: (2.0, 5.0),
        }
    }
}

impl Pauses {
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            failure: Duration::ZERO,
            rate_limited: (0.0, 0.0),
        }
    }
}

fn extract_mailtm_error(body: &Value, status: u16) -> String {
    body.get("hydra:description")
        .or_else(|| body.get("detail"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

// ── Client ──────────────────────────────────────────────────────────

pub struct MailTmClient {
    client: FetchClient,
    base_url: String,
    pauses: Pauses,
}

enum Attempt {
    Created(String),
    RateLimited,
    Failed(String),
}

impl MailTmClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, CliError> {
        Ok(Self {
            client: FetchClient::new("mail.tm", timeout, extract_mailtm_error)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            pauses: Pauses::default(),
        })
    }

    #[cfg(test)]
    pub fn with_pauses(mut self, pauses: Pauses) -> Self {
        self.pauses = pauses;
        self
    }

    /// Create a mailbox and return its address, or `None` once every attempt
    /// has failed.
    pub fn create_address<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.try_create(rng) {
                Attempt::Created(address) => return Some(address),
                Attempt::RateLimited => {
                    let (lo, hi) = self.pauses.rate_limited;
                    let secs = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
                    tracing::warn!("   [Mail.tm] Rate limited (429). Retrying in {:.2}s...", secs);
                    thread::sleep(Duration::from_secs_f64(secs));
                }
                Attempt::Failed(reason) => {
                    tracing::warn!("   [Mail.tm] Error on attempt {}: {}", attempt, reason);
                    thread::sleep(self.pauses.failure);
                }
            }
        }

        tracing::warn!("   [Warning] Mail.tm failed.");
        None
    }

    fn try_create<R: Rng + ?Sized>(&self, rng: &mut R) -> Attempt {
        let domain = match self.first_domain() {
            Ok(domain) => domain,
            Err(reason) => return Attempt::Failed(reason),
        };

        let address = format!("{}@{}", random_local_part(rng), domain);
        let password = Alphanumeric.sample_string(rng, PASSWORD_LEN);

        let resp = self
            .client
            .http
            .post(format!("{}/accounts", self.base_url))
            .json(&json!({ "address": address, "password": password }))
            .send();

        match resp {
            Ok(resp) => match resp.status().as_u16() {
                200 | 201 => {
                    tracing::debug!(%address, "created mailbox");
                    Attempt::Created(address)
                }
                429 => Attempt::RateLimited,
                status => {
                    let body: Value = resp.json().unwrap_or(Value::Null);
                    Attempt::Failed(format!(
                        "account creation rejected: {}",
                        extract_mailtm_error(&body, status)
                    ))
                }
            },
            Err(e) => Attempt::Failed(e.to_string()),
        }
    }

    fn first_domain(&self) -> Result<String, String> {
        let resp = self
            .client
            .http
            .get(format!("{}/domains", self.base_url))
            .send()
            .map_err(|e| e.to_string())?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(format!("domain listing returned HTTP {status}"));
        }

        let body: Value = resp.json().map_err(|e| e.to_string())?;
        body.get("hydra:member")
            .and_then(Value::as_array)
            .and_then(|members| members.first())
            .and_then(|member| member.get("domain"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| "no domains available".to_string())
    }
}

fn random_local_part<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..LOCAL_PART_LEN)
        .map(|_| LOCAL_PART_ALPHABET[rng.gen_range(0..LOCAL_PART_ALPHABET.len())] as char)
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────
