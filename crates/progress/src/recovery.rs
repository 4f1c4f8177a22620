use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use extract::{EntityCategory, EntityDiff, SeverityIndicators, extract_severity_indicators};

/// Heuristic recovery estimate for one document pair. Every percentage is in [0, 100].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryMetrics {
    pub overall_recovery_percentage: u32,
    pub bone_healing_percentage: u32,
    pub symptoms_improvement_percentage: u32,
    pub key_indicators: Vec<String>,
}

// Case-sensitive on purpose: "Healing is 40%" in a heading is not counted.
static PERCENT_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<pct>\d+)\s*%\s*(?P<kw>healing|recovery|improvement|progress)")
        .expect("valid regex")
});

static KEYWORD_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<kw>healing|recovery|improvement|progress)\s*(?:is|at)\s*(?P<pct>\d+)\s*%")
        .expect("valid regex")
});

static DECIMAL_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d$").expect("valid regex"));

const EARLY_WORDS: [&str; 3] = ["early", "slight", "minor"];
const PARTIAL_WORDS: [&str; 3] = ["partial", "some", "better"];
const SIGNIFICANT_WORDS: [&str; 3] = ["significant", "substantial", "major"];
const BONE_WORDS: [&str; 4] = ["bone", "fracture", "callus", "regrowth"];
const SYMPTOM_WORDS: [&str; 4] = ["pain", "function", "mobility", "movement"];

const CALLUS_PHRASE: &str = "callus formation";

#[derive(Debug, Clone, PartialEq, Eq)]
struct ExplicitPercentage {
    value: u64,
    keyword: String,
}

/// All "<N>% <keyword>" and "<keyword> is/at <N>%" statements, pattern by pattern,
/// old text before new text within each pattern.
fn explicit_percentages(old_text: &str, new_text: &str) -> Vec<ExplicitPercentage> {
    let mut found = Vec::new();
    for pattern in [&*PERCENT_FIRST, &*KEYWORD_FIRST] {
        for text in [old_text, new_text] {
            for caps in pattern.captures_iter(text) {
                found.push(ExplicitPercentage {
                    value: parse_digits(&caps["pct"]),
                    keyword: caps["kw"].to_string(),
                });
            }
        }
    }
    found
}

/// Value of a `\d+` run in any script, saturating on overflow.
fn parse_digits(digits: &str) -> u64 {
    digits
        .chars()
        .fold(0u64, |acc, c| acc.saturating_mul(10).saturating_add(digit_value(c)))
}

// Unicode decimal digits come in contiguous runs of ten, ascending from zero.
fn digit_value(c: char) -> u64 {
    if let Some(d) = c.to_digit(10) {
        return d as u64;
    }
    let mut offset = 0u64;
    let mut code = c as u32;
    while let Some(prev) = code.checked_sub(1).and_then(char::from_u32) {
        let mut buf = [0u8; 4];
        if !DECIMAL_DIGIT.is_match(prev.encode_utf8(&mut buf)) {
            break;
        }
        offset += 1;
        code -= 1;
    }
    offset % 10
}

fn mentions_any(indicators: &SeverityIndicators, words: &[&str]) -> bool {
    indicators
        .improvement
        .iter()
        .any(|i| words.iter().any(|w| i.contains(w)))
}

fn count_matching(indicators: &SeverityIndicators, words: &[&str]) -> u32 {
    indicators
        .improvement
        .iter()
        .filter(|i| words.iter().any(|w| i.contains(w)))
        .count() as u32
}

/// Estimate recovery from the wording of two sequential documents and their entity diff.
pub fn estimate_recovery(old_text: &str, new_text: &str, changes: &EntityDiff) -> RecoveryMetrics {
    let mut metrics = RecoveryMetrics::default();

    let explicit = explicit_percentages(old_text, new_text);

    if !explicit.is_empty() {
        let total = explicit.iter().fold(0u64, |acc, p| acc.saturating_add(p.value));
        let mean = (total as f64 / explicit.len() as f64).round_ties_even();
        metrics.overall_recovery_percentage = mean.min(100.0) as u32;
        metrics.key_indicators = explicit
            .iter()
            .map(|p| format!("{}% {}", p.value, p.keyword))
            .collect();
        debug!(matches = explicit.len(), overall = metrics.overall_recovery_percentage, "Explicit recovery percentages");
    } else {
        let old_indicators = extract_severity_indicators(old_text);
        let new_indicators = extract_severity_indicators(new_text);
        let mut improvement_score: u32 = 0;

        if mentions_any(&new_indicators, &EARLY_WORDS) {
            improvement_score += 20;
            metrics.key_indicators.push("Early stage healing detected".to_string());
        }

        if mentions_any(&new_indicators, &PARTIAL_WORDS) {
            improvement_score += 40;
            metrics.key_indicators.push("Partial recovery indicators found".to_string());
        }

        if mentions_any(&new_indicators, &SIGNIFICANT_WORDS) {
            improvement_score += 60;
            metrics.key_indicators.push("Significant recovery indicators found".to_string());
        }

        if new_text.contains(CALLUS_PHRASE) {
            improvement_score += 25;
            metrics.bone_healing_percentage = 25;
            metrics
                .key_indicators
                .push("Callus formation detected (25% bone healing)".to_string());
        }

        if old_indicators.severity.len() > new_indicators.severity.len() {
            improvement_score += 15;
            metrics.key_indicators.push("Decreased severity indicators".to_string());
        }

        let new_recovery = changes.added(EntityCategory::RecoveryIndicators).len() as u32;
        if new_recovery > 0 {
            let adjustment = (new_recovery * 10).min(30);
            improvement_score += adjustment;
            metrics.key_indicators.push(format!(
                "Found {} recovery indicators (+{}%)",
                new_recovery, adjustment
            ));
        }

        metrics.overall_recovery_percentage = improvement_score.min(100);

        if metrics.bone_healing_percentage == 0 {
            let bone = count_matching(&new_indicators, &BONE_WORDS);
            metrics.bone_healing_percentage = (bone * 15).min(100);
        }

        let symptoms = count_matching(&new_indicators, &SYMPTOM_WORDS);
        metrics.symptoms_improvement_percentage = (symptoms * 20).min(100);

        debug!(score = improvement_score, "Heuristic recovery estimate");
    }

    // Fill the sub-scores from the overall estimate when nothing specific was found.
    if metrics.bone_healing_percentage == 0 {
        metrics.bone_healing_percentage = metrics.overall_recovery_percentage.saturating_sub(5);
    }
    if metrics.symptoms_improvement_percentage == 0 {
        metrics.symptoms_improvement_percentage = metrics.overall_recovery_percentage.saturating_sub(10);
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::{diff, extract_entities};

    fn estimate(old_text: &str, new_text: &str) -> RecoveryMetrics {
        let changes = diff(&extract_entities(old_text), &extract_entities(new_text));
        estimate_recovery(old_text, new_text, &changes)
    }

    #[test]
    fn test_explicit_percentage() {
        let metrics = estimate("Initial assessment.", "Follow-up shows 75% healing of the site.");

        assert_eq!(metrics.overall_recovery_percentage, 75);
        assert_eq!(metrics.key_indicators, vec!["75% healing".to_string()]);
        assert_eq!(metrics.bone_healing_percentage, 70);
        assert_eq!(metrics.symptoms_improvement_percentage, 65);
    }

    #[test]
    fn test_explicit_mean_across_both_texts() {
        let metrics = estimate("recovery is 20%", "Now 50% recovery; healing at 61%");

        // Pattern order first, then old before new: 50, 20, 61.
        assert_eq!(
            metrics.key_indicators,
            vec!["50% recovery", "20% recovery", "61% healing"]
        );
        assert_eq!(metrics.overall_recovery_percentage, 44);
    }

    #[test]
    fn test_explicit_mean_rounds_half_to_even() {
        let metrics = estimate("", "40% healing and 45% recovery");
        assert_eq!(metrics.overall_recovery_percentage, 42);

        let metrics = estimate("", "41% healing and 46% recovery");
        assert_eq!(metrics.overall_recovery_percentage, 44);
    }

    #[test]
    fn test_explicit_percentage_capped() {
        let metrics = estimate("", "250% progress");
        assert_eq!(metrics.overall_recovery_percentage, 100);
        assert_eq!(metrics.key_indicators, vec!["250% progress".to_string()]);
    }

    #[test]
    fn test_explicit_percentage_overflowing_digits() {
        let metrics = estimate("", "5000000000% recovery");
        assert_eq!(metrics.overall_recovery_percentage, 100);
        assert_eq!(metrics.key_indicators, vec!["5000000000% recovery".to_string()]);

        let metrics = estimate("", "99999999999999999999999% healing");
        assert_eq!(metrics.overall_recovery_percentage, 100);
    }

    #[test]
    fn test_explicit_percentage_non_ascii_digits() {
        let metrics = estimate("", "٧٥% healing");
        assert_eq!(metrics.overall_recovery_percentage, 75);
        assert_eq!(metrics.key_indicators, vec!["75% healing".to_string()]);

        // Devanagari and full-width digits.
        assert_eq!(parse_digits("४२"), 42);
        assert_eq!(parse_digits("３０"), 30);
        assert_eq!(parse_digits("0075"), 75);
    }

    #[test]
    fn test_early_stage_heuristic() {
        // Same recovery wording on both sides, so no added-indicator bonus.
        let metrics = estimate("Fracture with slight improvement.", "There is slight improvement.");
        assert_eq!(metrics.overall_recovery_percentage, 20);
        assert_eq!(metrics.key_indicators, vec!["Early stage healing detected".to_string()]);
    }

    #[test]
    fn test_significant_recovery_heuristic() {
        let metrics = estimate("Fracture of radius.", "Alignment improved significantly.");
        assert_eq!(metrics.overall_recovery_percentage, 60);
        assert_eq!(
            metrics.key_indicators,
            vec!["Significant recovery indicators found".to_string()]
        );
    }

    #[test]
    fn test_capitalized_early_wording_not_counted() {
        let metrics = estimate("Early signs of healing.", "Early signs of healing.");
        assert!(metrics.key_indicators.is_empty());
        assert_eq!(metrics.overall_recovery_percentage, 0);
    }

    #[test]
    fn test_partial_recovery_heuristic() {
        let metrics = estimate("Fracture of radius.", "Fracture site improved partially.");

        assert_eq!(metrics.overall_recovery_percentage, 40);
        assert!(metrics
            .key_indicators
            .contains(&"Partial recovery indicators found".to_string()));
        assert_eq!(metrics.bone_healing_percentage, 35);
        assert_eq!(metrics.symptoms_improvement_percentage, 30);
    }

    #[test]
    fn test_callus_formation_sets_bone_healing() {
        let metrics = estimate(
            "Displaced fracture.",
            "There is callus formation. Slight bone regrowth and partial bone regrowth noted.",
        );

        assert_eq!(metrics.bone_healing_percentage, 25);
        assert!(metrics
            .key_indicators
            .contains(&"Callus formation detected (25% bone healing)".to_string()));
    }

    #[test]
    fn test_bone_keywords_without_callus() {
        // "Slight bone regrowth" and "partial bone regrowth" are two distinct indicators.
        let metrics = estimate("Displaced fracture.", "Slight bone regrowth and partial bone regrowth.");
        assert_eq!(metrics.bone_healing_percentage, 30);
    }

    #[test]
    fn test_decreased_severity() {
        let metrics = estimate("Severe fracture with extensive damage.", "Alignment maintained.");
        assert_eq!(metrics.overall_recovery_percentage, 15);
        assert_eq!(metrics.key_indicators, vec!["Decreased severity indicators".to_string()]);
    }

    #[test]
    fn test_recovery_indicator_bonus_capped() {
        let old_text = "Baseline.";
        let new_text = "healing, progress, regeneration, regrowth, decreased pain, increased mobility";
        let metrics = estimate(old_text, new_text);

        assert!(metrics
            .key_indicators
            .iter()
            .any(|k| k.starts_with("Found 6 recovery indicators (+30%)")));
        assert_eq!(metrics.overall_recovery_percentage, 30);
    }

    #[test]
    fn test_empty_inputs() {
        let metrics = estimate("", "");
        assert_eq!(metrics, RecoveryMetrics::default());
    }

    #[test]
    fn test_all_signals_clamp_to_100() {
        let metrics = estimate(
            "Severe fracture.",
            "Early signs of healing, partial recovery, improved significantly, callus formation, \
             healing process, bone regeneration, progress, regrowth",
        );
        assert_eq!(metrics.overall_recovery_percentage, 100);
        assert!(metrics.bone_healing_percentage <= 100);
        assert!(metrics.symptoms_improvement_percentage <= 100);
    }
}
