use std::collections::HashSet;

use crate::model::{GroundTruth, VerificationRecord};
use crate::normalize::normalize;

/// Normalized "known real" and "known fake" inputs for one scope.
///
/// The two sets are expected to be disjoint. Empty values (after
/// normalization) are never members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSets {
    real: HashSet<String>,
    fake: HashSet<String>,
}

impl ReferenceSets {
    pub fn new<S: AsRef<str>>(real: &[S], fake: &[S]) -> Self {
        Self {
            real: normalized_set(real),
            fake: normalized_set(fake),
        }
    }

    /// Ground truth for an already-normalized input. Real is checked first.
    pub fn lookup(&self, normalized: &str) -> GroundTruth {
        if self.real.contains(normalized) {
            GroundTruth::Real
        } else if self.fake.contains(normalized) {
            GroundTruth::Fake
        } else {
            GroundTruth::Unknown
        }
    }

    /// Values present in both sets, sorted. Non-empty means the reference
    /// lists were built wrong.
    pub fn overlap(&self) -> Vec<String> {
        let mut both: Vec<String> = self.real.intersection(&self.fake).cloned().collect();
        both.sort();
        both
    }

    pub fn real_len(&self) -> usize {
        self.real.len()
    }

    pub fn fake_len(&self) -> usize {
        self.fake.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty() && self.fake.is_empty()
    }
}

fn normalized_set<S: AsRef<str>>(values: &[S]) -> HashSet<String> {
    values
        .iter()
        .map(|v| normalize(v.as_ref()))
        .filter(|v| !v.is_empty())
        .collect()
}

/// Return copies of `records` with `ground_truth` set from the reference lists.
pub fn tag_ground_truth<S: AsRef<str>>(
    records: &[VerificationRecord],
    real: &[S],
    fake: &[S],
) -> Vec<VerificationRecord> {
    let sets = ReferenceSets::new(real, fake);
    let overlap = sets.overlap();
    if !overlap.is_empty() {
        tracing::warn!(
            count = overlap.len(),
            "inputs listed as both real and fake, tagging them Real: {}",
            overlap.join(", ")
        );
    }

    records
        .iter()
        .map(|record| {
            let mut tagged = record.clone();
            tagged.ground_truth = Some(sets.lookup(&record.normalized_input()));
            tagged
        })
        .collect()
}
