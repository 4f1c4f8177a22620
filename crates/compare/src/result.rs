use serde::Serialize;
use thiserror::Error;

use extract::EntityDiff;
use progress::ProgressReport;

#[derive(Error, Debug)]
pub enum ComparisonError {
    #[error("At least two documents are required for comparison")]
    InsufficientDocuments,

    #[error("Document comparison failed: {0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Similarity, diff and report for two consecutive documents.
#[derive(Debug, Clone, Serialize)]
pub struct PairwiseComparison {
    pub old_doc: String,
    pub new_doc: String,
    pub similarity: f64,
    pub changes: EntityDiff,
    pub report: ProgressReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    /// Mean of the consecutive pairwise similarities.
    pub overall_similarity: f64,
    pub pairwise_comparisons: Vec<PairwiseComparison>,
    /// First document against the last one.
    pub progress_report: ProgressReport,
}

/// Either a full result or an `{"error": ..}` object, never both.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ComparisonOutcome {
    Completed(ComparisonResult),
    Failed { error: String },
}

impl ComparisonOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Completed(_) => None,
            Self::Failed { error } => Some(error),
        }
    }

    pub fn result(&self) -> Option<&ComparisonResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Failed { .. } => None,
        }
    }
}

impl From<ComparisonError> for ComparisonOutcome {
    fn from(e: ComparisonError) -> Self {
        Self::Failed { error: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_outcome_shape() {
        let outcome = ComparisonOutcome::from(ComparisonError::InsufficientDocuments);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "At least two documents are required for comparison"})
        );
    }

    #[test]
    fn test_internal_error_message_includes_cause() {
        let err = anyhow::anyhow!("connection refused").context("Failed to embed document text");
        let outcome = ComparisonOutcome::from(ComparisonError::Internal(err));
        assert_eq!(
            outcome.error(),
            Some("Document comparison failed: Failed to embed document text: connection refused")
        );
    }
}
