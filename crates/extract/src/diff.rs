use crate::schema::{EntityDiff, EntitySet};

/// Added, removed and persisting mentions per category, from `old` to `new`.
/// Categories with nothing to report are left out of each map.
pub fn diff(old: &EntitySet, new: &EntitySet) -> EntityDiff {
    let mut changes = EntityDiff::default();

    for category in old.categories() {
        let before = old.get(category);
        let after = new.get(category);

        let added: Vec<String> = after.difference(before).cloned().collect();
        if !added.is_empty() {
            changes.added.insert(category, added);
        }

        let removed: Vec<String> = before.difference(after).cloned().collect();
        if !removed.is_empty() {
            changes.removed.insert(category, removed);
        }

        let persisting: Vec<String> = before.intersection(after).cloned().collect();
        if !persisting.is_empty() {
            changes.persisting.insert(category, persisting);
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::extract_entities;
    use crate::schema::EntityCategory;

    #[test]
    fn test_diff_against_itself() {
        let entities = extract_entities(
            "Diagnosed with tibia fracture. Treated with immobilization. Healing observed.",
        );
        let changes = diff(&entities, &entities);

        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());
        for category in EntityCategory::ALL {
            let expected: Vec<String> = entities.get(category).iter().cloned().collect();
            assert_eq!(changes.persisting(category), expected.as_slice());
        }
    }

    #[test]
    fn test_diff_added_removed() {
        let mut old = EntitySet::new();
        old.insert(EntityCategory::Conditions, "fracture");
        old.insert(EntityCategory::Conditions, "swelling");

        let mut new = EntitySet::new();
        new.insert(EntityCategory::Conditions, "fracture");
        new.insert(EntityCategory::RecoveryIndicators, "callus formation");

        let changes = diff(&old, &new);

        assert_eq!(changes.removed(EntityCategory::Conditions), ["swelling".to_string()]);
        assert_eq!(changes.persisting(EntityCategory::Conditions), ["fracture".to_string()]);
        assert_eq!(
            changes.added(EntityCategory::RecoveryIndicators),
            ["callus formation".to_string()]
        );
        assert!(!changes.added.contains_key(&EntityCategory::Conditions));
        assert!(!changes.removed.contains_key(&EntityCategory::Findings));
    }

    #[test]
    fn test_diff_is_case_sensitive() {
        let mut old = EntitySet::new();
        old.insert(EntityCategory::Conditions, "Fracture");
        let mut new = EntitySet::new();
        new.insert(EntityCategory::Conditions, "fracture");

        let changes = diff(&old, &new);
        assert_eq!(changes.added(EntityCategory::Conditions).len(), 1);
        assert_eq!(changes.removed(EntityCategory::Conditions).len(), 1);
    }
}
