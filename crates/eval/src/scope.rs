use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::country::{detect_country, CountryPrefixTable};
use crate::ground_truth::ReferenceSets;
use crate::metrics::{compute_with_sets, MetricsReport};
use crate::model::VerificationRecord;

/// Phone numbers bucketed by country code.
pub type PhonesByCountry = BTreeMap<String, Vec<String>>;

// ---------------------------------------------------------------------------
// Scope inputs
// ---------------------------------------------------------------------------

/// Every reference list a run knows about, before it is cut into scopes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeInputs {
    /// Real emails supplied by the operator.
    #[serde(default)]
    pub real_emails: Vec<String>,
    /// Real phone numbers supplied by the operator.
    #[serde(default)]
    pub real_phones: Vec<String>,
    #[serde(default)]
    pub standard_emails: Vec<String>,
    #[serde(default)]
    pub pro_emails: Vec<String>,
    /// Numbers scraped from the "active" listing (ground truth Real).
    #[serde(default)]
    pub scraped_active: PhonesByCountry,
    /// Numbers scraped from the "inactive" listing (ground truth Fake).
    #[serde(default)]
    pub scraped_inactive: PhonesByCountry,
    /// Structured fake numbers.
    #[serde(default)]
    pub generated_phones: PhonesByCountry,
}

impl ScopeInputs {
    pub fn active_scraped(&self) -> Vec<String> {
        flatten(&self.scraped_active)
    }

    pub fn inactive_scraped(&self) -> Vec<String> {
        flatten(&self.scraped_inactive)
    }

    pub fn generated(&self) -> Vec<String> {
        flatten(&self.generated_phones)
    }

    /// Every input that should be submitted to the email endpoint.
    pub fn all_emails(&self) -> Vec<String> {
        let mut all = self.standard_emails.clone();
        all.extend(self.pro_emails.iter().cloned());
        all.extend(self.real_emails.iter().cloned());
        all
    }

    /// Every input that should be submitted to the phone endpoint.
    pub fn all_phones(&self) -> Vec<String> {
        let mut all = self.active_scraped();
        all.extend(self.inactive_scraped());
        all.extend(self.generated());
        all.extend(self.real_phones.iter().cloned());
        all
    }

    pub fn real_phone_inputs(&self) -> Vec<String> {
        let mut real = self.real_phones.clone();
        real.extend(self.active_scraped());
        real
    }

    pub fn fake_phone_inputs(&self) -> Vec<String> {
        let mut fake = self.generated();
        fake.extend(self.inactive_scraped());
        fake
    }

    /// Global real list: operator emails + operator phones + active scraped.
    pub fn all_real(&self) -> Vec<String> {
        let mut real = self.real_emails.clone();
        real.extend(self.real_phone_inputs());
        real
    }

    /// Global fake list: generated emails + generated phones + inactive scraped.
    pub fn all_fake(&self) -> Vec<String> {
        let mut fake = self.standard_emails.clone();
        fake.extend(self.pro_emails.iter().cloned());
        fake.extend(self.fake_phone_inputs());
        fake
    }
}

fn flatten(buckets: &PhonesByCountry) -> Vec<String> {
    buckets.values().flatten().cloned().collect()
}

fn bucket<'a>(buckets: &'a PhonesByCountry, code: &str) -> &'a [String] {
    buckets.get(code).map(|v| v.as_slice()).unwrap_or(&[])
}

// ---------------------------------------------------------------------------
// Scopes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Overall,
    Email,
    Phone,
    Country,
}

impl Section {
    /// Banner printed before the first report of the section.
    pub fn heading(&self) -> Option<&'static str> {
        match self {
            Self::Overall | Self::Phone => None,
            Self::Email => Some("--- EMAIL METRICS ---"),
            Self::Country => Some("--- PHONE METRICS PER COUNTRY ---"),
        }
    }
}

/// One named subset: a label plus its own real/fake reference lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub label: String,
    pub section: Section,
    pub real: Vec<String>,
    pub fake: Vec<String>,
}

impl Scope {
    pub fn new(section: Section, label: impl Into<String>, real: Vec<String>, fake: Vec<String>) -> Self {
        Self {
            label: label.into(),
            section,
            real,
            fake,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty() && self.fake.is_empty()
    }
}

/// The fixed menu of scopes for a run, in reporting order.
///
/// Overall, the two email fake sets, the phone views (global, scraped,
/// active-only, inactive-only) and one scope per country in table order.
/// Scopes may share members; each is scored independently.
pub fn build_scopes(table: &CountryPrefixTable, inputs: &ScopeInputs) -> Vec<Scope> {
    let active = inputs.active_scraped();
    let inactive = inputs.inactive_scraped();

    let mut scopes = vec![
        Scope::new(Section::Overall, "OVERALL", inputs.all_real(), inputs.all_fake()),
        Scope::new(Section::Email, "EMAILS (Standard Fakes)", Vec::new(), inputs.standard_emails.clone()),
        Scope::new(Section::Email, "EMAILS (Pro Fakes)", Vec::new(), inputs.pro_emails.clone()),
        Scope::new(
            Section::Phone,
            "PHONES (Global)",
            inputs.real_phone_inputs(),
            inputs.fake_phone_inputs(),
        ),
        Scope::new(Section::Phone, "PHONES (Scraped Only)", active.clone(), inactive.clone()),
        Scope::new(Section::Phone, "PHONES (Active Scraped Only)", active, Vec::new()),
        Scope::new(Section::Phone, "PHONES (Inactive Scraped Only)", Vec::new(), inactive),
    ];

    let mut manual_by_country: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for phone in &inputs.real_phones {
        if let Some(code) = detect_country(table, phone).and_then(|m| m.code()) {
            manual_by_country.entry(code).or_default().push(phone.clone());
        }
    }

    for code in table.codes() {
        let mut real = manual_by_country.get(code).cloned().unwrap_or_default();
        real.extend_from_slice(bucket(&inputs.scraped_active, code));

        let mut fake = bucket(&inputs.generated_phones, code).to_vec();
        fake.extend_from_slice(bucket(&inputs.scraped_inactive, code));

        let label = format!("Phone: {code} ({} Real, {} Fake)", real.len(), fake.len());
        scopes.push(Scope::new(Section::Country, label, real, fake));
    }

    scopes
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeReport {
    pub section: Section,
    #[serde(flatten)]
    pub report: MetricsReport,
}

/// Reports for every scope that had at least one in-scope record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub reports: Vec<ScopeReport>,
    /// Labels of scopes that were skipped (no reference inputs or no matches).
    pub skipped_scopes: Vec<String>,
}

impl Evaluation {
    pub fn get(&self, label: &str) -> Option<&MetricsReport> {
        self.reports
            .iter()
            .find(|r| r.report.label == label)
            .map(|r| &r.report)
    }
}

/// Score `results` against every scope in order. `results` is only read.
pub fn evaluate_scopes(results: &[VerificationRecord], scopes: &[Scope]) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for scope in scopes {
        if scope.is_empty() {
            evaluation.skipped_scopes.push(scope.label.clone());
            continue;
        }

        let sets = ReferenceSets::new(&scope.real, &scope.fake);
        let overlap = sets.overlap();
        if !overlap.is_empty() {
            tracing::warn!(
                scope = %scope.label,
                "reference inputs listed as both real and fake: {}",
                overlap.join(", ")
            );
        }

        match compute_with_sets(results, &sets, &scope.label) {
            Some(report) => evaluation.reports.push(ScopeReport {
                section: scope.section,
                report,
            }),
            None => evaluation.skipped_scopes.push(scope.label.clone()),
        }
    }

    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(pairs: Vec<(&str, Vec<&str>)>) -> PhonesByCountry {
        pairs
            .into_iter()
            .map(|(code, phones)| (code.to_string(), phones.into_iter().map(String::from).collect()))
            .collect()
    }

    fn sample_inputs() -> ScopeInputs {
        ScopeInputs {
            real_emails: vec!["me@real.com".into()],
            real_phones: vec!["+447700900001".into(), "+999000".into()],
            standard_emails: vec!["std@fake.com".into()],
            pro_emails: vec!["pro@mail.tm".into()],
            scraped_active: codes(vec![("GB", vec!["+447700900002"]), ("US", vec!["+12025550101"])]),
            scraped_inactive: codes(vec![("GB", vec!["+447700900003"])]),
            generated_phones: codes(vec![("US", vec!["+12025550199"]), ("GB", vec![])]),
        }
    }

    #[test]
    fn menu_order_and_labels() {
        let table = CountryPrefixTable::default();
        let scopes = build_scopes(&table, &sample_inputs());
        let labels: Vec<&str> = scopes.iter().take(7).map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "OVERALL",
                "EMAILS (Standard Fakes)",
                "EMAILS (Pro Fakes)",
                "PHONES (Global)",
                "PHONES (Scraped Only)",
                "PHONES (Active Scraped Only)",
                "PHONES (Inactive Scraped Only)",
            ]
        );
        assert_eq!(scopes.len(), 7 + table.len());
    }

    #[test]
    fn overall_covers_everything() {
        let table = CountryPrefixTable::default();
        let scopes = build_scopes(&table, &sample_inputs());
        let overall = &scopes[0];
        assert_eq!(overall.real.len(), 1 + 2 + 2);
        assert_eq!(overall.fake.len(), 2 + 1 + 1);
    }

    #[test]
    fn country_scopes_intersect_manual_and_scraped() {
        let table = CountryPrefixTable::default();
        let scopes = build_scopes(&table, &sample_inputs());

        let gb = scopes.iter().find(|s| s.label.starts_with("Phone: GB")).unwrap();
        assert_eq!(gb.label, "Phone: GB (2 Real, 1 Fake)");
        assert_eq!(gb.real, vec!["+447700900001".to_string(), "+447700900002".to_string()]);
        assert_eq!(gb.fake, vec!["+447700900003".to_string()]);

        let us = scopes.iter().find(|s| s.label.starts_with("Phone: US")).unwrap();
        assert_eq!(us.label, "Phone: US (1 Real, 1 Fake)");

        let fr = scopes.iter().find(|s| s.label.starts_with("Phone: FR")).unwrap();
        assert!(fr.is_empty());
    }

    #[test]
    fn unmatched_manual_phone_only_in_global_scopes() {
        let table = CountryPrefixTable::default();
        let scopes = build_scopes(&table, &sample_inputs());
        let in_country = scopes
            .iter()
            .filter(|s| s.section == Section::Country)
            .any(|s| s.real.iter().any(|p| p == "+999000"));
        assert!(!in_country);
        assert!(scopes[3].real.contains(&"+999000".to_string()));
    }

    #[test]
    fn empty_scopes_are_skipped() {
        let scopes = vec![
            Scope::new(Section::Email, "empty", Vec::new(), Vec::new()),
            Scope::new(Section::Email, "no-matches", vec!["nobody@x.com".into()], Vec::new()),
        ];
        let evaluation = evaluate_scopes(&[], &scopes);
        assert!(evaluation.reports.is_empty());
        assert_eq!(evaluation.skipped_scopes, vec!["empty".to_string(), "no-matches".to_string()]);
    }

    #[test]
    fn section_headings() {
        assert_eq!(Section::Overall.heading(), None);
        assert_eq!(Section::Email.heading(), Some("--- EMAIL METRICS ---"));
        assert_eq!(Section::Country.heading(), Some("--- PHONE METRICS PER COUNTRY ---"));
    }
}
