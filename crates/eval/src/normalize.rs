/// Canonical form used for every set-membership comparison: trimmed, lowercased.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
