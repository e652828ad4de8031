use std::fmt;

use serde::Serialize;

use crate::ground_truth::ReferenceSets;
use crate::model::{GroundTruth, VerificationRecord};
use crate::verdict::{classify_value, describe_value, Verdict};

// ---------------------------------------------------------------------------
// Confusion matrix
// ---------------------------------------------------------------------------

/// Counts over one scope. "Positive" means the API called the input valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Count one classified record. Unknown ground truth and skipped
    /// verdicts are ignored.
    pub fn record(&mut self, actual: GroundTruth, predicted: Verdict) {
        match (actual, predicted) {
            (GroundTruth::Real, Verdict::Valid) => self.true_positives += 1,
            (GroundTruth::Real, Verdict::Invalid) => self.false_negatives += 1,
            (GroundTruth::Fake, Verdict::Valid) => self.false_positives += 1,
            (GroundTruth::Fake, Verdict::Invalid) => self.true_negatives += 1,
            (GroundTruth::Unknown, _) | (_, Verdict::Skip) => {}
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// An in-scope record whose verdict could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedVerdict {
    pub input: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub label: String,
    /// Records that belonged to the scope, including skipped ones.
    pub in_scope: usize,
    pub matrix: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedVerdict>,
}

impl MetricsReport {
    fn from_matrix(label: &str, in_scope: usize, matrix: ConfusionMatrix, skipped: Vec<SkippedVerdict>) -> Self {
        Self {
            label: label.to_string(),
            in_scope,
            accuracy: matrix.accuracy(),
            precision: matrix.precision(),
            recall: matrix.recall(),
            f1: matrix.f1(),
            matrix,
            skipped,
        }
    }
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.matrix;
        writeln!(f, "--- Metrics: {} ---", self.label)?;
        writeln!(
            f,
            "Total: {} | TP: {} | TN: {} | FP: {} | FN: {}",
            m.total(),
            m.true_positives,
            m.true_negatives,
            m.false_positives,
            m.false_negatives,
        )?;
        write!(
            f,
            "Accuracy:  {:.2}% | Precision: {:.2} | Recall: {:.2} | F1: {:.2}",
            self.accuracy * 100.0,
            self.precision,
            self.recall,
            self.f1,
        )?;
        if !self.skipped.is_empty() {
            write!(f, "\nSkipped (unrecognized IsValid): {}", self.skipped.len())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Score `results` against one scope's real/fake reference lists.
///
/// Records whose input is in neither list are outside the scope and ignored.
/// Records with an unrecognized validity value are dropped with a warning.
/// Returns `None` when no record belongs to the scope.
pub fn compute_metrics<S: AsRef<str>>(
    results: &[VerificationRecord],
    real: &[S],
    fake: &[S],
    label: &str,
) -> Option<MetricsReport> {
    let sets = ReferenceSets::new(real, fake);
    compute_with_sets(results, &sets, label)
}

/// Same as [`compute_metrics`] with prebuilt reference sets.
pub fn compute_with_sets(
    results: &[VerificationRecord],
    sets: &ReferenceSets,
    label: &str,
) -> Option<MetricsReport> {
    let mut matrix = ConfusionMatrix::default();
    let mut in_scope = 0usize;
    let mut skipped = Vec::new();

    for record in results {
        let input = record.normalized_input();
        let actual = sets.lookup(&input);
        if actual == GroundTruth::Unknown {
            continue;
        }
        in_scope += 1;

        let predicted = classify_value(record.is_valid.as_ref());
        if predicted == Verdict::Skip {
            let raw = describe_value(record.is_valid.as_ref());
            tracing::warn!(scope = label, "unknown IsValid value for {input}: {raw}");
            skipped.push(SkippedVerdict { input, raw });
            continue;
        }

        matrix.record(actual, predicted);
    }

    if in_scope == 0 {
        return None;
    }

    Some(MetricsReport::from_matrix(label, in_scope, matrix, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordKind;

    fn rec(input: &str, valid: &str) -> VerificationRecord {
        VerificationRecord::new(RecordKind::Email, input).with_validity(valid)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn matrix_cells() {
        let mut m = ConfusionMatrix::default();
        m.record(GroundTruth::Real, Verdict::Valid);
        m.record(GroundTruth::Real, Verdict::Invalid);
        m.record(GroundTruth::Fake, Verdict::Valid);
        m.record(GroundTruth::Fake, Verdict::Invalid);
        m.record(GroundTruth::Fake, Verdict::Invalid);
        m.record(GroundTruth::Unknown, Verdict::Valid);
        m.record(GroundTruth::Real, Verdict::Skip);
        assert_eq!(m.true_positives, 1);
        assert_eq!(m.false_negatives, 1);
        assert_eq!(m.false_positives, 1);
        assert_eq!(m.true_negatives, 2);
        assert_eq!(m.total(), 5);
    }

    #[test]
    fn derived_rates() {
        let m = ConfusionMatrix {
            true_positives: 3,
            true_negatives: 4,
            false_positives: 1,
            false_negatives: 2,
        };
        assert!(approx(m.accuracy(), 0.7));
        assert!(approx(m.precision(), 0.75));
        assert!(approx(m.recall(), 0.6));
        assert!(approx(m.f1(), 2.0 * 0.75 * 0.6 / 1.35));
    }

    #[test]
    fn zero_denominators_are_zero() {
        let m = ConfusionMatrix {
            true_negatives: 3,
            ..Default::default()
        };
        assert!(approx(m.accuracy(), 1.0));
        assert_eq!(m.precision(), 0.0);
        assert_eq!(m.recall(), 0.0);
        assert_eq!(m.f1(), 0.0);
        assert_eq!(ConfusionMatrix::default().accuracy(), 0.0);
    }

    #[test]
    fn perfect_scope() {
        let results = vec![rec("a@x.com", "Yes"), rec("b@x.com", "No")];
        let report = compute_metrics(&results, &["a@x.com"], &["b@x.com"], "perfect").unwrap();
        assert_eq!(report.matrix.true_positives, 1);
        assert_eq!(report.matrix.true_negatives, 1);
        assert_eq!(report.matrix.false_positives, 0);
        assert_eq!(report.matrix.false_negatives, 0);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.precision, 1.0);
        assert_eq!(report.recall, 1.0);
        assert_eq!(report.f1, 1.0);
    }

    #[test]
    fn swapped_labels() {
        let results = vec![rec("a@x.com", "Yes"), rec("b@x.com", "No")];
        let report = compute_metrics(&results, &["b@x.com"], &["a@x.com"], "swapped").unwrap();
        assert_eq!(report.matrix.false_positives, 1);
        assert_eq!(report.matrix.false_negatives, 1);
        assert_eq!(report.matrix.total(), 2);
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.f1, 0.0);
    }

    #[test]
    fn out_of_scope_records_not_counted() {
        let results = vec![rec("a@x.com", "Yes"), rec("other@x.com", "Yes")];
        let report = compute_metrics(&results, &["a@x.com"], &[] as &[&str], "scoped").unwrap();
        assert_eq!(report.in_scope, 1);
        assert_eq!(report.matrix.total(), 1);
    }

    #[test]
    fn unrecognized_verdict_is_skipped_not_counted() {
        let results = vec![
            rec("a@x.com", "Yes"),
            rec("b@x.com", "banana"),
            VerificationRecord::new(RecordKind::Phone, "+12025550143"),
        ];
        let report =
            compute_metrics(&results, &["a@x.com", "+12025550143"], &["b@x.com"], "skips").unwrap();
        assert_eq!(report.in_scope, 3);
        assert_eq!(report.matrix.total(), 1);
        assert_eq!(
            report.skipped,
            vec![
                SkippedVerdict { input: "b@x.com".into(), raw: "banana".into() },
                SkippedVerdict { input: "+12025550143".into(), raw: "<missing>".into() },
            ]
        );
    }

    #[test]
    fn all_skipped_still_reports_zeroes() {
        let results = vec![rec("a@x.com", "Unknown")];
        let report = compute_metrics(&results, &["a@x.com"], &[] as &[&str], "skipped").unwrap();
        assert_eq!(report.matrix.total(), 0);
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn empty_scope_yields_none() {
        let results = vec![rec("a@x.com", "Yes")];
        assert!(compute_metrics(&results, &["zzz@x.com"], &["yyy@x.com"], "none").is_none());
        assert!(compute_metrics(&[], &["a@x.com"], &[] as &[&str], "none").is_none());
    }

    #[test]
    fn display_block() {
        let results = vec![rec("a@x.com", "Yes"), rec("b@x.com", "Yes")];
        let report = compute_metrics(&results, &["a@x.com"], &["b@x.com"], "OVERALL").unwrap();
        let text = report.to_string();
        assert_eq!(
            text,
            "--- Metrics: OVERALL ---\n\
             Total: 2 | TP: 1 | TN: 0 | FP: 1 | FN: 0\n\
             Accuracy:  50.00% | Precision: 0.50 | Recall: 1.00 | F1: 0.67"
        );
    }
}
