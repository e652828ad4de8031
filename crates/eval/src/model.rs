use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::normalize::normalize;

// ---------------------------------------------------------------------------
// Record kind + ground truth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Email,
    Phone,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => write!(f, "Email"),
            Self::Phone => write!(f, "Phone"),
        }
    }
}

/// Externally known classification of a test input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroundTruth {
    Real,
    Fake,
    Unknown,
}

impl std::fmt::Display for GroundTruth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real => write!(f, "Real"),
            Self::Fake => write!(f, "Fake"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Verification record
// ---------------------------------------------------------------------------

/// One input after it went through the validation API.
///
/// Known keys are typed; everything else the provider returned is kept in
/// `fields` and round-trips unchanged. Serialized keys match the provider's
/// PascalCase naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    #[serde(rename = "Type")]
    pub kind: RecordKind,

    #[serde(rename = "Input", default, deserialize_with = "lenient_string")]
    pub input: Option<String>,

    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Raw validity signal. Strings on the email endpoint, whatever the phone
    /// endpoint returned on the other.
    #[serde(rename = "IsValid", default)]
    pub is_valid: Option<Value>,

    #[serde(rename = "GroundTruth", default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<GroundTruth>,

    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl VerificationRecord {
    pub fn new(kind: RecordKind, input: impl Into<String>) -> Self {
        Self {
            kind,
            input: Some(input.into()),
            status: None,
            is_valid: None,
            ground_truth: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_validity(mut self, is_valid: impl Into<Value>) -> Self {
        self.is_valid = Some(is_valid.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Input in canonical form; a missing input is the empty string.
    pub fn normalized_input(&self) -> String {
        self.input.as_deref().map(normalize).unwrap_or_default()
    }

    /// Input for display, `<missing>` when the provider sent none.
    pub fn display_input(&self) -> &str {
        self.input.as_deref().unwrap_or("<missing>")
    }
}

/// Accept any JSON scalar for `Input`; numbers and booleans are stringified.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
