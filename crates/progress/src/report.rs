use serde::{Deserialize, Serialize};

use extract::{EntityCategory, EntityDiff};
use similarity::interpret_similarity;

use crate::recovery::{RecoveryMetrics, estimate_recovery};

pub const NO_CHANGES_SUMMARY: &str = "No significant changes in conditions or findings were detected.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub similarity_score: f64,
    pub similarity_interpretation: String,
    pub changes: EntityDiff,
    pub progress_summary: String,
    pub recovery_metrics: RecoveryMetrics,
    pub treatment_recommendations: Vec<String>,
}

/// Build the progress report for one (older, newer) document pair.
pub fn synthesize(old_text: &str, new_text: &str, similarity: f64, changes: EntityDiff) -> ProgressReport {
    let recovery_metrics = estimate_recovery(old_text, new_text, &changes);

    ProgressReport {
        similarity_score: similarity,
        similarity_interpretation: interpret_similarity(similarity).to_string(),
        progress_summary: build_summary(&recovery_metrics, &changes),
        treatment_recommendations: recommend(&recovery_metrics),
        changes,
        recovery_metrics,
    }
}

fn build_summary(metrics: &RecoveryMetrics, changes: &EntityDiff) -> String {
    let mut parts = Vec::new();

    if metrics.overall_recovery_percentage > 0 {
        parts.push(format!(
            "Patient shows approximately {}% overall recovery from the initial condition.",
            metrics.overall_recovery_percentage
        ));
    }
    if metrics.bone_healing_percentage > 0 {
        parts.push(format!(
            "Bone healing is estimated at {}%.",
            metrics.bone_healing_percentage
        ));
    }
    if metrics.symptoms_improvement_percentage > 0 {
        parts.push(format!(
            "Symptoms have improved by approximately {}%.",
            metrics.symptoms_improvement_percentage
        ));
    }

    let listed = [
        (changes.removed(EntityCategory::Conditions), "Previously identified conditions no longer present"),
        (changes.added(EntityCategory::Conditions), "Newly identified conditions"),
        (changes.removed(EntityCategory::Findings), "Previous findings no longer present"),
        (changes.added(EntityCategory::Findings), "New findings"),
        (changes.added(EntityCategory::RecoveryIndicators), "Positive recovery indicators"),
    ];
    for (mentions, label) in listed {
        if !mentions.is_empty() {
            parts.push(format!("{}: {}.", label, mentions.join(", ")));
        }
    }

    if parts.is_empty() {
        NO_CHANGES_SUMMARY.to_string()
    } else {
        parts.join(" ")
    }
}

fn recommend(metrics: &RecoveryMetrics) -> Vec<String> {
    let overall = match metrics.overall_recovery_percentage {
        0..25 => "Limited recovery observed. Consider reevaluating current treatment approach.",
        25..50 => "Early stages of recovery detected. Continue current treatment with close monitoring.",
        50..75 => "Moderate recovery progress. Continue current treatment regimen with periodic follow-ups.",
        _ => "Significant recovery observed. Consider transitioning to maintenance therapy or rehabilitation.",
    };

    let bone = match metrics.bone_healing_percentage {
        0..30 => "Limited bone healing observed. Maintain immobilization and consider nutritional supplements to support bone formation.",
        30..60 => "Moderate bone healing progress. Consider gradual weight-bearing exercises if appropriate for this stage.",
        _ => "Advanced bone healing observed. Consider physical therapy to restore full functionality.",
    };

    vec![overall.to_string(), bone.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::{diff, extract_entities};

    fn report(old_text: &str, new_text: &str, similarity: f64) -> ProgressReport {
        let changes = diff(&extract_entities(old_text), &extract_entities(new_text));
        synthesize(old_text, new_text, similarity, changes)
    }

    fn metrics(overall: u32, bone: u32) -> RecoveryMetrics {
        RecoveryMetrics {
            overall_recovery_percentage: overall,
            bone_healing_percentage: bone,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_changes_summary() {
        let r = report("", "", 1.0);
        assert_eq!(r.progress_summary, NO_CHANGES_SUMMARY);
        assert!(r.similarity_interpretation.starts_with("The documents are highly similar"));
        assert_eq!(r.treatment_recommendations.len(), 2);
        assert!(r.treatment_recommendations[0].starts_with("Limited recovery observed."));
        assert!(r.treatment_recommendations[1].starts_with("Limited bone healing observed."));
    }

    #[test]
    fn test_summary_sentence_order() {
        let r = report(
            "Patient diagnosed with tibia fracture. X-ray shows displaced fragments.",
            "Follow-up shows 60% healing. Callus formation observed around the site.",
            0.8,
        );

        let summary = &r.progress_summary;
        let overall = summary.find("Patient shows approximately 60% overall recovery").unwrap();
        let bone = summary.find("Bone healing is estimated at 55%.").unwrap();
        let symptoms = summary.find("Symptoms have improved by approximately 50%.").unwrap();
        let removed_conditions = summary.find("Previously identified conditions no longer present: ").unwrap();
        let removed_findings = summary.find("Previous findings no longer present: displaced fragments.").unwrap();
        let added_findings = summary.find("New findings: ").unwrap();
        let recovery = summary.find("Positive recovery indicators: ").unwrap();

        assert!(overall < bone && bone < symptoms && symptoms < removed_conditions);
        assert!(removed_conditions < removed_findings);
        assert!(removed_findings < added_findings && added_findings < recovery);
        assert!(!summary.contains("Newly identified conditions"));
    }

    #[test]
    fn test_overall_brackets() {
        let cases = [
            (0, "Limited recovery observed."),
            (24, "Limited recovery observed."),
            (25, "Early stages of recovery detected."),
            (49, "Early stages of recovery detected."),
            (50, "Moderate recovery progress."),
            (74, "Moderate recovery progress."),
            (75, "Significant recovery observed."),
            (100, "Significant recovery observed."),
        ];
        for (overall, expected) in cases {
            let recs = recommend(&metrics(overall, 0));
            assert!(recs[0].starts_with(expected), "overall {}", overall);
        }
    }

    #[test]
    fn test_bone_brackets() {
        let cases = [
            (29, "Limited bone healing observed."),
            (30, "Moderate bone healing progress."),
            (59, "Moderate bone healing progress."),
            (60, "Advanced bone healing observed."),
        ];
        for (bone, expected) in cases {
            let recs = recommend(&metrics(0, bone));
            assert!(recs[1].starts_with(expected), "bone {}", bone);
        }
    }

    #[test]
    fn test_report_serializes_changes() {
        let r = report("Fracture noted.", "Fracture noted. Healing observed.", 0.93);
        let json = serde_json::to_value(&r).unwrap();

        assert_eq!(json["similarity_score"], 0.93);
        assert!(json["changes"]["persisting"]["conditions"].is_array());
        assert!(json["changes"]["added"]["recovery_indicators"].is_array());
        assert!(json["recovery_metrics"]["overall_recovery_percentage"].is_u64());
    }
}
