//! Shared infrastructure for the upstream adapters.
//!
//! Each adapter (loqate, mailtm, scrape) reuses:
//! - `FetchClient`: HTTP client with retry, backoff and error classification
//! - `resolve_api_key`: flag > env > error
//!
//! # Retry policy
//!
//! - 401/403 → `EXIT_FETCH_AUTH`, no retry
//! - 400 → `EXIT_FETCH_VALIDATION`, no retry
//! - other 4xx → `EXIT_FETCH_UPSTREAM`, no retry
//! - 429 / 5xx / network errors → up to `MAX_RETRIES` retries with
//!   exponential backoff; 429 honors `Retry-After` (seconds, capped at
//!   `MAX_RETRY_AFTER_SECS`)

use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::HeaderMap;

use crate::exit_codes;
use crate::CliError;

// ── Constants ───────────────────────────────────────────────────────

pub(crate) const MAX_RETRIES: u32 = 3;
/// Longest `Retry-After` we are willing to sleep for.
pub(crate) const MAX_RETRY_AFTER_SECS: u64 = 60;
pub(crate) const USER_AGENT: &str = concat!("contactcheck/", env!("CARGO_PKG_VERSION"));

// ── FetchClient ─────────────────────────────────────────────────────

/// Shared HTTP client that handles retry, backoff, and error classification.
///
/// Adapters own their key and URLs. They pass a request-building closure to
/// [`FetchClient::request_with_retry`], which runs the retry loop and maps
/// HTTP status codes to the standard exit codes.
pub(crate) struct FetchClient {
    pub(crate) http: Client,
    source_name: String,
    error_extractor: fn(&serde_json::Value, u16) -> String,
    initial_backoff_secs: u64,
    max_retry_after_secs: u64,
}

impl FetchClient {
    pub(crate) fn new(
        source_name: &str,
        timeout: Duration,
        error_extractor: fn(&serde_json::Value, u16) -> String,
    ) -> Result<Self, CliError> {
        Self::with_headers(source_name, timeout, HeaderMap::new(), error_extractor)
    }

    pub(crate) fn with_headers(
        source_name: &str,
        timeout: Duration,
        headers: HeaderMap,
        error_extractor: fn(&serde_json::Value, u16) -> String,
    ) -> Result<Self, CliError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| CliError {
                code: exit_codes::EXIT_ERROR,
                message: format!("failed to build HTTP client for {source_name}: {e}"),
                hint: None,
            })?;

        Ok(Self {
            http,
            source_name: source_name.to_string(),
            error_extractor,
            initial_backoff_secs: 1,
            max_retry_after_secs: MAX_RETRY_AFTER_SECS,
        })
    }

    #[cfg(test)]
    pub(crate) fn without_backoff(mut self) -> Self {
        self.initial_backoff_secs = 0;
        self.max_retry_after_secs = 0;
        self
    }

    pub(crate) fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Send a request with retry + exponential backoff and parse the JSON body.
    ///
    /// `build_request` is called once per attempt and must return a fully
    /// configured `RequestBuilder` (URL, method, query/form params).
    pub(crate) fn request_with_retry(
        &self,
        build_request: impl Fn(&Client) -> RequestBuilder,
    ) -> Result<serde_json::Value, CliError> {
        let text = self.request_with_retry_text(build_request)?;

        // Some providers prefix JSON with a BOM
        let trimmed = text.trim_start_matches('\u{feff}');
        serde_json::from_str(trimmed).map_err(|e| CliError {
            code: exit_codes::EXIT_FETCH_UPSTREAM,
            message: format!(
                "failed to parse {} JSON response: {} (body: {})",
                self.source_name,
                e,
                truncate(trimmed, 200),
            ),
            hint: None,
        })
    }

    /// Like `request_with_retry`, but returns the raw body (HTML pages).
    pub(crate) fn request_with_retry_text(
        &self,
        build_request: impl Fn(&Client) -> RequestBuilder,
    ) -> Result<String, CliError> {
        let resp = self.send_with_retry(build_request)?;
        resp.text().map_err(|e| CliError {
            code: exit_codes::EXIT_FETCH_UPSTREAM,
            message: format!("failed to read {} response body: {}", self.source_name, e),
            hint: None,
        })
    }

    fn send_with_retry(
        &self,
        build_request: impl Fn(&Client) -> RequestBuilder,
    ) -> Result<Response, CliError> {
        let mut backoff_secs = self.initial_backoff_secs;
        let mut attempt = 0u32;

        loop {
            let failure = match build_request(&self.http).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if status < 400 {
                        return Ok(resp);
                    }
                    if status != 429 && status < 500 {
                        return Err(self.client_error(resp, status));
                    }

                    let wait = if status == 429 {
                        retry_after_secs(resp.headers(), backoff_secs, self.max_retry_after_secs)
                    } else {
                        backoff_secs
                    };
                    Failure::Status { status, wait }
                }
                Err(e) => Failure::Network {
                    message: e.to_string(),
                    wait: backoff_secs,
                },
            };

            if attempt == MAX_RETRIES {
                return Err(self.exhausted(failure));
            }
            attempt += 1;

            let (wait, reason) = match &failure {
                Failure::Status { status, wait } => (*wait, format!("HTTP {status}")),
                Failure::Network { message, wait } => (*wait, message.clone()),
            };
            tracing::warn!(
                source = %self.source_name,
                "retry {}/{} in {}s ({})",
                attempt,
                MAX_RETRIES,
                wait,
                reason,
            );
            thread::sleep(Duration::from_secs(wait));
            backoff_secs *= 2;
        }
    }

    fn client_error(&self, resp: Response, status: u16) -> CliError {
        let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
        let msg = (self.error_extractor)(&body, status);
        let (code, what) = match status {
            401 | 403 => (exit_codes::EXIT_FETCH_AUTH, "auth failed"),
            400 => (exit_codes::EXIT_FETCH_VALIDATION, "request rejected"),
            _ => (exit_codes::EXIT_FETCH_UPSTREAM, "error"),
        };
        CliError {
            code,
            message: format!("{} {} ({}): {}", self.source_name, what, status, msg),
            hint: None,
        }
    }

    fn exhausted(&self, failure: Failure) -> CliError {
        match failure {
            Failure::Status { status: 429, .. } => CliError {
                code: exit_codes::EXIT_FETCH_RATE_LIMIT,
                message: format!(
                    "{} rate limited after {} attempts (429)",
                    self.source_name, MAX_RETRIES,
                ),
                hint: None,
            },
            Failure::Status { status, .. } => CliError {
                code: exit_codes::EXIT_FETCH_UPSTREAM,
                message: format!(
                    "{} upstream error after {} attempts ({})",
                    self.source_name, MAX_RETRIES, status,
                ),
                hint: None,
            },
            Failure::Network { message, .. } => CliError {
                code: exit_codes::EXIT_FETCH_UPSTREAM,
                message: format!(
                    "{} upstream error after {} attempts: {}",
                    self.source_name, MAX_RETRIES, message,
                ),
                hint: None,
            },
        }
    }
}

enum Failure {
    Status { status: u16, wait: u64 },
    Network { message: String, wait: u64 },
}

/// Seconds to wait after a 429: the `Retry-After` value clamped to `cap`,
/// or `fallback` when the header is absent or not a number of seconds.
fn retry_after_secs(headers: &HeaderMap, fallback: u64, cap: u64) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(fallback, |secs| secs.min(cap))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Resolve the Loqate API key: flag value > environment variable > error.
/// `dotenv` is the file the key could have been loaded from; it is named in
/// the hint.
pub(crate) fn resolve_api_key(flag: Option<&str>, dotenv: &Path) -> Result<String, CliError> {
    let lookup = contactcheck_config::get_api_key(flag);
    match lookup.key {
        Some(key) => {
            tracing::debug!(source = lookup.source.as_str(), "using Loqate API key");
            Ok(key)
        }
        None => Err(CliError {
            code: exit_codes::EXIT_FETCH_NOT_AUTH,
            message: format!(
                "missing Loqate API key (use --api-key or set {})",
                contactcheck_config::credentials::API_KEY_ENV,
            ),
            hint: Some(format!(
                "or add {}=... to {}",
                contactcheck_config::credentials::API_KEY_ENV,
                dotenv.display(),
            )),
        }),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn plain_extractor(body: &serde_json::Value, status: u16) -> String {
        body["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}"))
    }

    fn client() -> FetchClient {
        FetchClient::new("Test", Duration::from_secs(5), plain_extractor)
            .unwrap()
            .without_backoff()
    }

    #[test]
    fn test_resolve_api_key_flag_priority() {
        let key = resolve_api_key(Some("  KEY-123  "), Path::new(".env")).unwrap();
        assert_eq!(key, "KEY-123");
    }

    #[test]
    fn test_resolve_api_key_empty_flag() {
        let dotenv = Path::new("/etc/contactcheck/.env");
        let err = resolve_api_key(Some("   "), dotenv).unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_FETCH_NOT_AUTH);
        assert!(err.message.contains("missing Loqate API key"));
        assert_eq!(
            err.hint.as_deref(),
            Some("or add LOQATE_API_KEY=... to /etc/contactcheck/.env")
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn test_json_success_strips_bom() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/ok");
            then.status(200).body("\u{feff}{\"Items\": []}");
        });

        let body = client()
            .request_with_retry(|http| http.get(server.url("/ok")))
            .unwrap();
        mock.assert();
        assert!(body["Items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_auth_failure_is_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/secret");
            then.status(401).json_body(serde_json::json!({ "message": "bad key" }));
        });

        let err = client()
            .request_with_retry(|http| http.get(server.url("/secret")))
            .unwrap_err();
        mock.assert_calls(1);
        assert_eq!(err.code, exit_codes::EXIT_FETCH_AUTH);
        assert!(err.message.contains("bad key"), "{}", err.message);
    }

    #[test]
    fn test_bad_request_maps_to_validation() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/submit");
            then.status(400).json_body(serde_json::json!({}));
        });

        let err = client()
            .request_with_retry(|http| http.post(server.url("/submit")))
            .unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_FETCH_VALIDATION);
        assert!(err.message.contains("HTTP 400"));
    }

    #[test]
    fn test_rate_limit_exhausted() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/busy");
            then.status(429).header("retry-after", "0");
        });

        let err = client()
            .request_with_retry(|http| http.get(server.url("/busy")))
            .unwrap_err();
        mock.assert_calls((MAX_RETRIES + 1) as usize);
        assert_eq!(err.code, exit_codes::EXIT_FETCH_RATE_LIMIT);
    }

    #[test]
    fn test_retry_after_is_capped() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_secs(&headers, 4, MAX_RETRY_AFTER_SECS), 4);

        headers.insert(reqwest::header::RETRY_AFTER, "7".parse().unwrap());
        assert_eq!(retry_after_secs(&headers, 4, MAX_RETRY_AFTER_SECS), 7);

        headers.insert(reqwest::header::RETRY_AFTER, "86400".parse().unwrap());
        assert_eq!(retry_after_secs(&headers, 4, MAX_RETRY_AFTER_SECS), MAX_RETRY_AFTER_SECS);

        headers.insert(
            reqwest::header::RETRY_AFTER,
            "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap(),
        );
        assert_eq!(retry_after_secs(&headers, 4, MAX_RETRY_AFTER_SECS), 4);
    }

    #[test]
    fn test_huge_retry_after_does_not_stall() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/slow-down");
            then.status(429).header("retry-after", "999999");
        });

        let started = std::time::Instant::now();
        let err = client()
            .request_with_retry(|http| http.get(server.url("/slow-down")))
            .unwrap_err();
        mock.assert_calls((MAX_RETRIES + 1) as usize);
        assert_eq!(err.code, exit_codes::EXIT_FETCH_RATE_LIMIT);
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_server_error_exhausted() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/down");
            then.status(503);
        });

        let err = client()
            .request_with_retry_text(|http| http.get(server.url("/down")))
            .unwrap_err();
        mock.assert_calls((MAX_RETRIES + 1) as usize);
        assert_eq!(err.code, exit_codes::EXIT_FETCH_UPSTREAM);
        assert!(err.message.contains("503"));
    }

    #[test]
    fn test_malformed_json_is_upstream_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/html");
            then.status(200).body("<html>nope</html>");
        });

        let err = client()
            .request_with_retry(|http| http.get(server.url("/html")))
            .unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_FETCH_UPSTREAM);
        assert!(err.message.contains("<html>"));
    }
}
