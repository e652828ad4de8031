//! CLI Exit Code Registry
//!
//! Single source of truth for `contactcheck` exit codes. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                                |
//! |---------|------------|--------------------------------------------|
//! | 0       | Universal  | Success                                    |
//! | 1       | Universal  | General error (unspecified)                |
//! | 2       | Universal  | CLI usage error (bad args)                 |
//! | 3-4     | Files      | Dataset / results IO and parse failures    |
//! | 10-19   | config     | Settings file and credentials              |
//! | 50-59   | fetch      | Loqate, mail.tm and scrape connectors      |

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, conflicting options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Files (3-4)
// =============================================================================

/// Cannot read or write a dataset, results or log file.
pub const EXIT_IO: u8 = 3;

/// A dataset or results file exists but is not valid JSON of the right shape.
pub const EXIT_PARSE: u8 = 4;

// =============================================================================
// Config (10-19)
// =============================================================================

/// Settings file missing, unparsable or invalid.
pub const EXIT_CONFIG_INVALID: u8 = 10;

/// `.env` file present but unreadable.
pub const EXIT_CONFIG_ENV: u8 = 11;

// =============================================================================
// Fetch / adapter (50-59): external services
// =============================================================================

/// No Loqate API key (neither flag nor env var).
pub const EXIT_FETCH_NOT_AUTH: u8 = 50;

/// Auth rejected by upstream (401/403, or a Loqate account-level error).
pub const EXIT_FETCH_AUTH: u8 = 51;

/// Bad request rejected by upstream (400).
pub const EXIT_FETCH_VALIDATION: u8 = 52;

/// Rate limited after retries (429).
pub const EXIT_FETCH_RATE_LIMIT: u8 = 53;

/// Upstream error (5xx), malformed payload, or network failure after retries.
pub const EXIT_FETCH_UPSTREAM: u8 = 54;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_IO,
            EXIT_PARSE,
            EXIT_CONFIG_INVALID,
            EXIT_CONFIG_ENV,
            EXIT_FETCH_NOT_AUTH,
            EXIT_FETCH_AUTH,
            EXIT_FETCH_VALIDATION,
            EXIT_FETCH_RATE_LIMIT,
            EXIT_FETCH_UPSTREAM,
        ];
        let unique: std::collections::HashSet<u8> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
