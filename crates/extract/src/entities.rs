use crate::patterns::{self, PatternSet};
use crate::schema::{EntityCategory, EntitySet, SeverityIndicators};

fn patterns_for(category: EntityCategory) -> &'static PatternSet {
    match category {
        EntityCategory::Conditions => &patterns::CONDITIONS,
        EntityCategory::Treatments => &patterns::TREATMENTS,
        EntityCategory::Measurements => &patterns::MEASUREMENTS,
        EntityCategory::Findings => &patterns::FINDINGS,
        EntityCategory::RecoveryIndicators => &patterns::RECOVERY,
    }
}

/// Extract categorized medical mentions from free text.
pub fn extract_entities(text: &str) -> EntitySet {
    let mut entities = EntitySet::new();
    for category in EntityCategory::ALL {
        for mention in patterns_for(category).mentions(text) {
            entities.insert(category, mention);
        }
    }
    entities
}

/// Second, narrower pass picking up severity and improvement wording.
pub fn extract_severity_indicators(text: &str) -> SeverityIndicators {
    SeverityIndicators {
        severity: patterns::SEVERITY.mentions(text).collect(),
        improvement: patterns::IMPROVEMENT.mentions(text).collect(),
    }
}
