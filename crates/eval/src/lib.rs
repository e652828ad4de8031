//! `contactcheck-eval`: ground-truth reconciliation and accuracy metrics.
//!
//! Pure engine crate: receives verification records plus real/fake reference
//! lists, returns tagged records and per-scope confusion-matrix reports.
//! No CLI, network or file IO dependencies.

pub mod country;
pub mod ground_truth;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod scope;
pub mod verdict;

pub use country::{detect_country, CountryMatch, CountryPrefix, CountryPrefixTable};
pub use ground_truth::{tag_ground_truth, ReferenceSets};
pub use metrics::{compute_metrics, ConfusionMatrix, MetricsReport};
pub use model::{GroundTruth, RecordKind, VerificationRecord};
pub use normalize::normalize;
pub use scope::{build_scopes, evaluate_scopes, Evaluation, Scope, ScopeInputs, Section};
pub use verdict::{classify_validity, Verdict};
