use std::collections::BTreeMap;

use contactcheck_eval::scope::PhonesByCountry;
use contactcheck_eval::{
    build_scopes, compute_metrics, evaluate_scopes, tag_ground_truth, CountryPrefixTable,
    GroundTruth, RecordKind, ScopeInputs, Section, VerificationRecord,
};

fn email(input: &str, valid: &str) -> VerificationRecord {
    VerificationRecord::new(RecordKind::Email, input)
        .with_status(if valid == "Yes" { "Valid" } else { "Invalid" })
        .with_validity(valid)
}

fn phone(input: &str, valid: &str) -> VerificationRecord {
    VerificationRecord::new(RecordKind::Phone, input)
        .with_validity(valid)
        .with_field("NumberType", "Mobile")
}

fn by_country(pairs: Vec<(&str, Vec<&str>)>) -> PhonesByCountry {
    let mut map = BTreeMap::new();
    for (code, phones) in pairs {
        map.insert(code.to_string(), phones.into_iter().map(String::from).collect());
    }
    map
}

fn inputs() -> ScopeInputs {
    ScopeInputs {
        real_emails: vec!["Owner@Company.com".into()],
        real_phones: vec!["+447700900001".into()],
        standard_emails: vec!["jane.doe@example.org".into(), "john.roe@example.net".into()],
        pro_emails: vec!["k3j2h1@mail.tm".into()],
        scraped_active: by_country(vec![("US", vec!["+12025550101"])]),
        scraped_inactive: by_country(vec![("GB", vec!["+447700900777"])]),
        generated_phones: by_country(vec![("US", vec!["+12025550199"]), ("DE", vec!["+4915112345678"])]),
    }
}

fn results() -> Vec<VerificationRecord> {
    vec![
        // real email, API says valid (TP)
        email("owner@company.com ", "Yes"),
        // standard fakes: one caught (TN), one missed (FP)
        email("jane.doe@example.org", "No"),
        email("JOHN.ROE@example.net", "Yes"),
        // disposable: caught (TN)
        email("k3j2h1@mail.tm", "No"),
        // phones
        phone("+447700900001", "Yes"),
        phone("+12025550101", "Maybe"),
        phone("+447700900777", "Unknown"),
        phone("+12025550199", "No"),
        phone("+4915112345678", "No"),
        // never part of any reference list
        phone("+33100000000", "Yes"),
    ]
}

#[test]
fn overall_scope_counts_every_known_input() {
    let table = CountryPrefixTable::default();
    let scopes = build_scopes(&table, &inputs());
    let evaluation = evaluate_scopes(&results(), &scopes);

    let overall = evaluation.get("OVERALL").unwrap();
    assert_eq!(overall.in_scope, 9);
    // "+447700900777" has an unrecognized verdict
    assert_eq!(overall.matrix.total(), 8);
    assert_eq!(overall.matrix.true_positives, 2);
    assert_eq!(overall.matrix.false_negatives, 1);
    assert_eq!(overall.matrix.false_positives, 1);
    assert_eq!(overall.matrix.true_negatives, 4);
    assert_eq!(overall.skipped.len(), 1);
    assert_eq!(overall.skipped[0].input, "+447700900777");
}

#[test]
fn email_scopes_only_see_their_fakes() {
    let table = CountryPrefixTable::default();
    let evaluation = evaluate_scopes(&results(), &build_scopes(&table, &inputs()));

    let standard = evaluation.get("EMAILS (Standard Fakes)").unwrap();
    assert_eq!(standard.matrix.total(), 2);
    assert_eq!(standard.matrix.true_negatives, 1);
    assert_eq!(standard.matrix.false_positives, 1);
    assert_eq!(standard.precision, 0.0);
    assert_eq!(standard.accuracy, 0.5);

    let pro = evaluation.get("EMAILS (Pro Fakes)").unwrap();
    assert_eq!(pro.matrix.total(), 1);
    assert_eq!(pro.matrix.true_negatives, 1);
}

#[test]
fn phone_scopes_overlap_in_membership() {
    let table = CountryPrefixTable::default();
    let evaluation = evaluate_scopes(&results(), &build_scopes(&table, &inputs()));

    let global = evaluation.get("PHONES (Global)").unwrap();
    assert_eq!(global.in_scope, 5);

    let scraped = evaluation.get("PHONES (Scraped Only)").unwrap();
    assert_eq!(scraped.in_scope, 2);
    assert_eq!(scraped.matrix.false_negatives, 1);

    let active = evaluation.get("PHONES (Active Scraped Only)").unwrap();
    assert_eq!(active.matrix.false_negatives, 1);

    // the only inactive number was skipped, but the scope still reports
    let inactive = evaluation.get("PHONES (Inactive Scraped Only)").unwrap();
    assert_eq!(inactive.matrix.total(), 0);
    assert_eq!(inactive.in_scope, 1);

    // +12025550101 counts in the global, scraped, active and US scopes
    let us = evaluation.get("Phone: US (1 Real, 1 Fake)").unwrap();
    assert_eq!(us.matrix.false_negatives, 1);
    assert_eq!(us.matrix.true_negatives, 1);
}

#[test]
fn country_scopes_without_data_produce_no_report() {
    let table = CountryPrefixTable::default();
    let evaluation = evaluate_scopes(&results(), &build_scopes(&table, &inputs()));

    let countries: Vec<&str> = evaluation
        .reports
        .iter()
        .filter(|r| r.section == Section::Country)
        .map(|r| r.report.label.as_str())
        .collect();
    assert_eq!(
        countries,
        vec![
            "Phone: US (1 Real, 1 Fake)",
            "Phone: GB (1 Real, 1 Fake)",
            "Phone: DE (0 Real, 1 Fake)",
        ]
    );
    assert!(evaluation.get("Phone: FR (0 Real, 0 Fake)").is_none());
    assert!(evaluation
        .skipped_scopes
        .contains(&"Phone: FR (0 Real, 0 Fake)".to_string()));
}

#[test]
fn reports_follow_menu_order() {
    let table = CountryPrefixTable::default();
    let evaluation = evaluate_scopes(&results(), &build_scopes(&table, &inputs()));
    let sections: Vec<Section> = evaluation.reports.iter().map(|r| r.section).collect();
    let mut sorted = sections.clone();
    sorted.sort_by_key(|s| match s {
        Section::Overall => 0,
        Section::Email => 1,
        Section::Phone => 2,
        Section::Country => 3,
    });
    assert_eq!(sections, sorted);
}

#[test]
fn metrics_are_idempotent_and_do_not_touch_results() {
    let results = results();
    let snapshot = results.clone();
    let real = vec!["owner@company.com", "+447700900001"];
    let fake = vec!["jane.doe@example.org", "john.roe@example.net"];

    let first = compute_metrics(&results, &real, &fake, "repeat");
    let second = compute_metrics(&results, &real, &fake, "repeat");
    assert_eq!(first, second);
    assert_eq!(results, snapshot);
}

#[test]
fn zero_overlap_scope_has_no_report() {
    let results = results();
    let report = compute_metrics(&results, &["nobody@nowhere.io"], &["+10000000000"], "nothing");
    assert!(report.is_none());
}

#[test]
fn tagging_uses_global_lists() {
    let inputs = inputs();
    let tagged = tag_ground_truth(&results(), &inputs.all_real(), &inputs.all_fake());

    let truth: Vec<GroundTruth> = tagged.iter().filter_map(|r| r.ground_truth).collect();
    assert_eq!(
        truth,
        vec![
            GroundTruth::Real,
            GroundTruth::Fake,
            GroundTruth::Fake,
            GroundTruth::Fake,
            GroundTruth::Real,
            GroundTruth::Real,
            GroundTruth::Fake,
            GroundTruth::Fake,
            GroundTruth::Fake,
            GroundTruth::Unknown,
        ]
    );
}

#[test]
fn generated_reference_lists_are_disjoint() {
    let inputs = inputs();
    let sets = contactcheck_eval::ReferenceSets::new(&inputs.all_real(), &inputs.all_fake());
    assert!(sets.overlap().is_empty(), "overlap: {:?}", sets.overlap());
}

#[test]
fn evaluation_serializes_flat_reports() {
    let table = CountryPrefixTable::default();
    let evaluation = evaluate_scopes(&results(), &build_scopes(&table, &inputs()));
    let json = serde_json::to_value(&evaluation).unwrap();
    let first = &json["reports"][0];
    assert_eq!(first["section"], "overall");
    assert_eq!(first["label"], "OVERALL");
    assert_eq!(first["matrix"]["true_positives"], 2);
    assert!(first["skipped"].is_array());
}
