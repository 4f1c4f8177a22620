use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use extract::{EntitySet, diff, extract_entities};
use ingest::{Document, StagingArea, TextExtractor};
use progress::synthesize;
use similarity::{Embedder, cosine_similarity};

use crate::result::{ComparisonError, ComparisonOutcome, ComparisonResult, PairwiseComparison};

#[derive(Debug, Clone, Default)]
pub struct ComparatorConfig {
    /// Parent directory for per-request staging; the system temp dir when unset.
    pub staging_root: Option<PathBuf>,
}

/// Runs the comparison pipeline over chronologically ordered documents.
pub struct Comparator {
    extractor: TextExtractor,
    embedder: Arc<dyn Embedder>,
    config: ComparatorConfig,
}

impl Comparator {
    pub fn new(extractor: TextExtractor, embedder: Arc<dyn Embedder>, config: ComparatorConfig) -> Self {
        Self {
            extractor,
            embedder,
            config,
        }
    }

    pub fn with_embedder(embedder: Arc<dyn Embedder>) -> Self {
        Self::new(TextExtractor::default(), embedder, ComparatorConfig::default())
    }

    /// Compare documents in the order given. Failures come back as the error outcome.
    pub async fn compare(&self, documents: &[Document]) -> ComparisonOutcome {
        match self.try_compare(documents).await {
            Ok(result) => ComparisonOutcome::Completed(result),
            Err(e) => {
                match &e {
                    ComparisonError::InsufficientDocuments => {
                        warn!(documents = documents.len(), "Comparison rejected")
                    }
                    ComparisonError::Internal(cause) => {
                        error!(error = %format!("{:#}", cause), "Error in document comparison")
                    }
                }
                e.into()
            }
        }
    }

    pub async fn try_compare(&self, documents: &[Document]) -> Result<ComparisonResult, ComparisonError> {
        if documents.len() < 2 {
            return Err(ComparisonError::InsufficientDocuments);
        }

        let staging = match &self.config.staging_root {
            Some(root) => StagingArea::new_in(root)?,
            None => StagingArea::new()?,
        };

        let result = self.run(documents, &staging).await;

        // Staged files go regardless of how the run ended.
        if let Err(e) = staging.close() {
            warn!(error = %e, "Failed to clean up staged documents");
        }

        Ok(result?)
    }

    async fn run(&self, documents: &[Document], staging: &StagingArea) -> Result<ComparisonResult> {
        info!(documents = documents.len(), "Comparing documents");

        let mut texts = Vec::with_capacity(documents.len());
        for doc in documents {
            let text = self.extractor
                .extract(doc, staging)
                .await
                .context(format!("Failed to extract text from {}", doc.name))?;
            texts.push(text);
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for (doc, text) in documents.iter().zip(&texts) {
            let vector = self.embedder
                .embed(text)
                .await
                .context(format!("Failed to embed {}", doc.name))?;
            vectors.push(vector);
        }

        let entities: Vec<EntitySet> = texts.iter().map(|t| extract_entities(t)).collect();

        let mut pairwise_comparisons = Vec::with_capacity(documents.len() - 1);
        for i in 0..documents.len() - 1 {
            let similarity = cosine_similarity(&vectors[i], &vectors[i + 1])?;
            let changes = diff(&entities[i], &entities[i + 1]);
            let report = synthesize(&texts[i], &texts[i + 1], similarity, changes.clone());

            debug!(
                old_doc = %documents[i].name,
                new_doc = %documents[i + 1].name,
                similarity,
                overall_recovery = report.recovery_metrics.overall_recovery_percentage,
                "Compared pair"
            );

            pairwise_comparisons.push(PairwiseComparison {
                old_doc: documents[i].name.clone(),
                new_doc: documents[i + 1].name.clone(),
                similarity,
                changes,
                report,
            });
        }

        let overall_similarity = pairwise_comparisons.iter().map(|p| p.similarity).sum::<f64>()
            / pairwise_comparisons.len() as f64;

        let last = documents.len() - 1;
        let end_to_end = cosine_similarity(&vectors[0], &vectors[last])?;
        let progress_report = synthesize(
            &texts[0],
            &texts[last],
            end_to_end,
            diff(&entities[0], &entities[last]),
        );

        info!(
            pairs = pairwise_comparisons.len(),
            overall_similarity,
            overall_recovery = progress_report.recovery_metrics.overall_recovery_percentage,
            "Comparison complete"
        );

        Ok(ComparisonResult {
            overall_similarity,
            pairwise_comparisons,
            progress_report,
        })
    }
}
