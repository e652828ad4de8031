use serde::{Deserialize, Serialize};

/// Default dialing-prefix table, in reporting order.
pub const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("US", "+1"),
    ("GB", "+44"),
    ("AU", "+61"),
    ("FR", "+33"),
    ("DE", "+49"),
    ("IN", "+91"),
    ("JP", "+81"),
    ("CN", "+86"),
    ("BR", "+55"),
    ("AT", "+43"),
    ("BE", "+32"),
    ("CH", "+41"),
    ("ES", "+34"),
    ("IT", "+39"),
    ("NL", "+31"),
    ("RU", "+7"),
    ("SE", "+46"),
    ("ZA", "+27"),
    ("MX", "+52"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryPrefix {
    pub code: String,
    pub prefix: String,
}

impl CountryPrefix {
    pub fn new(code: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            prefix: prefix.into(),
        }
    }
}

/// Country code → dialing prefix, matched longest prefix first.
///
/// `entries` keeps configuration order (used for reporting); `match_order`
/// holds indices into `entries` sorted by prefix length, longest first.
/// The sort is stable, so equal-length prefixes keep configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryPrefixTable {
    entries: Vec<CountryPrefix>,
    match_order: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryMatch<'a> {
    Code(&'a str),
    Unknown,
}

impl<'a> CountryMatch<'a> {
    pub fn code(&self) -> Option<&'a str> {
        match *self {
            Self::Code(code) => Some(code),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for CountryMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

impl CountryPrefixTable {
    pub fn new(entries: Vec<CountryPrefix>) -> Self {
        let mut match_order: Vec<usize> = (0..entries.len()).collect();
        match_order.sort_by(|&a, &b| entries[b].prefix.len().cmp(&entries[a].prefix.len()));
        Self {
            entries,
            match_order,
        }
    }

    pub fn entries(&self) -> &[CountryPrefix] {
        &self.entries
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.code.as_str())
    }

    pub fn prefix_for(&self, code: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.prefix.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order they are tried against a phone number.
    pub fn in_match_order(&self) -> impl Iterator<Item = &CountryPrefix> {
        self.match_order.iter().map(|&i| &self.entries[i])
    }
}

impl Default for CountryPrefixTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_PREFIXES
                .iter()
                .map(|(code, prefix)| CountryPrefix::new(*code, *prefix))
                .collect(),
        )
    }
}

/// Map a phone string to the country whose prefix it starts with.
///
/// `None` for an empty input, `Unknown` when no prefix matches.
pub fn detect_country<'a>(table: &'a CountryPrefixTable, phone: &str) -> Option<CountryMatch<'a>> {
    if phone.is_empty() {
        return None;
    }
    let found = table
        .in_match_order()
        .find(|entry| phone.starts_with(entry.prefix.as_str()))
        .map(|entry| CountryMatch::Code(entry.code.as_str()))
        .unwrap_or(CountryMatch::Unknown);
    Some(found)
}
