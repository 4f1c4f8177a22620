pub mod orchestrator;
pub mod result;

pub use orchestrator::{Comparator, ComparatorConfig};
pub use result::{ComparisonError, ComparisonOutcome, ComparisonResult, PairwiseComparison};
