//! Loqate email (batch) and phone (individual) validation.

use std::time::Duration;

use contactcheck_config::Settings;
use contactcheck_eval::{RecordKind, VerificationRecord};
use serde_json::Value;

use crate::exit_codes;
use crate::CliError;

use super::common::FetchClient;

// ── Constants ───────────────────────────────────────────────────────

/// Extra fields copied from an email item, in provider spelling where it
/// differs (`IsDisposible` upstream, `IsDisposable` in our records).
const EMAIL_FIELDS: [(&str, &str); 4] = [
    ("Account", "Account"),
    ("Domain", "Domain"),
    ("IsDisposible", "IsDisposable"),
    ("IsSystemMailbox", "IsSystemMailbox"),
];

const PHONE_FIELDS: [&str; 7] = [
    "RequestProcessed",
    "NetworkCode",
    "NetworkName",
    "NetworkCountry",
    "NationalFormat",
    "CountryPrefix",
    "NumberType",
];

/// Error numbers that concern the account rather than the request: unknown
/// key, out of credit, daily limit reached, key disabled.
const ACCOUNT_ERRORS: [&str; 4] = ["2", "3", "8", "11"];

// ── Error payloads ──────────────────────────────────────────────────

/// Loqate answers most failures with HTTP 200 and an error item.
fn extract_loqate_error(body: &Value, status: u16) -> String {
    match item_error(body) {
        Some((code, description)) => format!("{description} (error {code})"),
        None => format!("HTTP {status}"),
    }
}

fn item_error(body: &Value) -> Option<(String, String)> {
    let first = body.get("Items")?.as_array()?.first()?;
    let code = match first.get("Error")? {
        Value::String(s) => s.clone(),
        Value::Null => return None,
        other => other.to_string(),
    };
    let description = first
        .get("Description")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    Some((code, description))
}

/// Account-level errors abort the run; anything else is a per-request failure.
fn check_error_payload(body: &Value) -> Result<(), CliError> {
    let Some((code, description)) = item_error(body) else {
        return Ok(());
    };

    if ACCOUNT_ERRORS.contains(&code.as_str()) {
        return Err(CliError {
            code: exit_codes::EXIT_FETCH_AUTH,
            message: format!("Loqate rejected the account: {description} (error {code})"),
            hint: Some("check LOQATE_API_KEY and the account's remaining credit".into()),
        });
    }

    Err(CliError {
        code: exit_codes::EXIT_FETCH_UPSTREAM,
        message: format!("Loqate error {code}: {description}"),
        hint: None,
    })
}

fn is_fatal(err: &CliError) -> bool {
    err.code == exit_codes::EXIT_FETCH_AUTH
}

// ── Item mapping ────────────────────────────────────────────────────

/// Map one batch item to an email record.
///
/// `IsValid` is "Yes" only for a status starting with "valid" on a
/// non-disposable mailbox. "Unknown" and the rest are "No".
pub(crate) fn parse_email_item(item: &Value) -> VerificationRecord {
    let status = item.get("Status").and_then(Value::as_str);
    let disposable = item
        .get("IsDisposible")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let valid = status
        .map(|s| s.to_lowercase().starts_with("valid"))
        .unwrap_or(false)
        && !disposable;

    let mut record = VerificationRecord {
        kind: RecordKind::Email,
        input: item
            .get("EmailAddress")
            .and_then(Value::as_str)
            .map(str::to_string),
        status: status.map(str::to_string),
        is_valid: Some(Value::from(if valid { "Yes" } else { "No" })),
        ground_truth: None,
        fields: Default::default(),
    };
    for (upstream, ours) in EMAIL_FIELDS {
        let value = item.get(upstream).cloned().unwrap_or(Value::Null);
        record.fields.insert(ours.to_string(), value);
    }
    record
}

/// Map the first phone item to a record. `IsValid` is kept verbatim.
pub(crate) fn parse_phone_item(phone: &str, item: &Value) -> VerificationRecord {
    let mut record = VerificationRecord::new(RecordKind::Phone, phone);
    record.is_valid = item.get("IsValid").cloned();
    for key in PHONE_FIELDS {
        let value = item.get(key).cloned().unwrap_or(Value::Null);
        record.fields.insert(key.to_string(), value);
    }
    record
}

// ── Loqate client ───────────────────────────────────────────────────

pub struct LoqateClient {
    client: FetchClient,
    api_key: String,
    email_url: String,
    phone_url: String,
    chunk_size: usize,
}

impl LoqateClient {
    pub fn new(api_key: String, settings: &Settings) -> Result<Self, CliError> {
        Self::with_endpoints(
            api_key,
            settings.endpoints.email_batch.clone(),
            settings.endpoints.phone_individual.clone(),
            settings.email_chunk_size,
            Duration::from_secs(settings.http_timeout_secs),
        )
    }

    pub fn with_endpoints(
        api_key: String,
        email_url: String,
        phone_url: String,
        chunk_size: usize,
        timeout: Duration,
    ) -> Result<Self, CliError> {
        Ok(Self {
            client: FetchClient::new("Loqate", timeout, extract_loqate_error)?,
            api_key,
            email_url,
            phone_url,
            chunk_size: chunk_size.max(1),
        })
    }

    #[cfg(test)]
    fn without_backoff(mut self) -> Self {
        self.client = self.client.without_backoff();
        self
    }

    /// Verify emails in batches. A failed batch is logged and skipped;
    /// account-level errors abort.
    pub fn verify_emails(&self, emails: &[String]) -> Result<Vec<VerificationRecord>, CliError> {
        let mut results: Vec<VerificationRecord> = Vec::new();

        for chunk in emails.chunks(self.chunk_size) {
            tracing::info!("[Email Batch] Verifying {} emails...", chunk.len());
            let joined = chunk.join(",");

            let body = self
                .client
                .request_with_retry(|http| {
                    http.post(&self.email_url)
                        .form(&[("Key", self.api_key.as_str()), ("Emails", joined.as_str())])
                })
                .and_then(|body| check_error_payload(&body).map(|_| body));

            let body = match body {
                Ok(body) => body,
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    tracing::warn!("[Email Batch] Error: {}", e.message);
                    continue;
                }
            };

            let Some(items) = body.get("Items").and_then(Value::as_array) else {
                tracing::warn!("[Email Batch] response has no Items, skipping batch");
                continue;
            };

            for item in items {
                let record = parse_email_item(item);
                tracing::info!(
                    "   Processed: {} -> {}",
                    record.display_input(),
                    record.status.as_deref().unwrap_or("<none>"),
                );
                if !results.contains(&record) {
                    results.push(record);
                }
            }
        }

        Ok(results)
    }

    /// Verify one phone number. `Ok(None)` when the request failed or the
    /// response had no items; account-level errors are returned.
    pub fn verify_phone(&self, phone: &str) -> Result<Option<VerificationRecord>, CliError> {
        let body = self
            .client
            .request_with_retry(|http| {
                http.get(&self.phone_url)
                    .query(&[("Key", self.api_key.as_str()), ("Phone", phone)])
            })
            .and_then(|body| check_error_payload(&body).map(|_| body));

        let body = match body {
            Ok(body) => body,
            Err(e) if is_fatal(&e) => return Err(e),
            Err(e) => {
                tracing::warn!("[Phone] Error verifying {}: {}", phone, e.message);
                return Ok(None);
            }
        };

        let Some(item) = body
            .get("Items")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
        else {
            tracing::warn!("[Phone] No result for {}", phone);
            return Ok(None);
        };

        let record = parse_phone_item(phone, item);
        tracing::info!(
            "   Processed: {} -> {}",
            phone,
            contactcheck_eval::verdict::describe_value(record.is_valid.as_ref()),
        );
        Ok(Some(record))
    }

    /// Verify every phone in order, dropping the ones that produced no record.
    pub fn verify_phones(&self, phones: &[String]) -> Result<Vec<VerificationRecord>, CliError> {
        tracing::info!("[Phone] Verifying {} numbers...", phones.len());
        let mut results = Vec::with_capacity(phones.len());
        for phone in phones {
            if let Some(record) = self.verify_phone(phone)? {
                results.push(record);
            }
        }
        Ok(results)
    }

    pub fn source_name(&self) -> &str {
        self.client.source_name()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
