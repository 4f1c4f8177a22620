use anyhow::Result;
use serde::Serialize;

/// Cosine similarity of two embeddings, clipped to [-1, 1].
///
/// A zero-magnitude vector is treated as dissimilar to everything (0.0).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    anyhow::ensure!(
        a.len() == b.len(),
        "Embedding dimensions differ: {} vs {}",
        a.len(),
        b.len()
    );

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum();
    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        Ok(0.0)
    } else {
        Ok((dot / (mag_a * mag_b)).clamp(-1.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityBand {
    HighlySimilar,
    Moderate,
    SignificantDifferences,
    VastlyDifferent,
}

impl SimilarityBand {
    pub fn from_score(score: f64) -> Self {
        if score > 0.9 {
            Self::HighlySimilar
        } else if score > 0.7 {
            Self::Moderate
        } else if score > 0.5 {
            Self::SignificantDifferences
        } else {
            Self::VastlyDifferent
        }
    }

    pub fn interpretation(&self) -> &'static str {
        match self {
            Self::HighlySimilar => "The documents are highly similar, but they may still contain important differences in medical details.",
            Self::Moderate => "The documents show moderate similarity, indicating some changes in the patient's condition.",
            Self::SignificantDifferences => "The documents have significant differences, suggesting substantial changes in the patient's condition.",
            Self::VastlyDifferent => "The documents are vastly different, indicating major changes or potentially different patients/conditions.",
        }
    }
}

pub fn interpret_similarity(score: f64) -> &'static str {
    SimilarityBand::from_score(score).interpretation()
}
