use serde::Serialize;
use serde_json::Value;

/// Tri-state reading of the provider's validity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Invalid,
    /// Neither a recognized positive nor a negative signal. Never counted.
    Skip,
}

const VALID_SIGNALS: &[&str] = &["yes", "true"];
const INVALID_SIGNALS: &[&str] = &["no", "false", "maybe"];

/// Classify a validity string. Case-insensitive, whitespace is significant.
pub fn classify_validity(raw: &str) -> Verdict {
    let lowered = raw.to_lowercase();
    if VALID_SIGNALS.contains(&lowered.as_str()) {
        Verdict::Valid
    } else if INVALID_SIGNALS.contains(&lowered.as_str()) {
        Verdict::Invalid
    } else {
        Verdict::Skip
    }
}

/// Classify the raw `IsValid` value of a record.
///
/// The phone endpoint may send booleans, which coerce to `"true"`/`"false"`.
/// A missing or null field is unclassifiable.
pub fn classify_value(raw: Option<&Value>) -> Verdict {
    match raw {
        None | Some(Value::Null) => Verdict::Skip,
        Some(Value::String(s)) => classify_validity(s),
        Some(Value::Bool(true)) => Verdict::Valid,
        Some(Value::Bool(false)) => Verdict::Invalid,
        Some(other) => classify_validity(&other.to_string()),
    }
}

/// Render a raw validity value for warnings and skip lists.
pub fn describe_value(raw: Option<&Value>) -> String {
    match raw {
        None => "<missing>".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
