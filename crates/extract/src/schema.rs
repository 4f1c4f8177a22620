use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

static EMPTY: BTreeSet<String> = BTreeSet::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Conditions,
    Treatments,
    Measurements,
    Findings,
    RecoveryIndicators,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 5] = [
        EntityCategory::Conditions,
        EntityCategory::Treatments,
        EntityCategory::Measurements,
        EntityCategory::Findings,
        EntityCategory::RecoveryIndicators,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conditions => "conditions",
            Self::Treatments => "treatments",
            Self::Measurements => "measurements",
            Self::Findings => "findings",
            Self::RecoveryIndicators => "recovery_indicators",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicated mentions per category. Every category is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet(BTreeMap<EntityCategory, BTreeSet<String>>);

impl EntitySet {
    pub fn new() -> Self {
        Self(
            EntityCategory::ALL
                .iter()
                .map(|c| (*c, BTreeSet::new()))
                .collect(),
        )
    }

    pub fn insert(&mut self, category: EntityCategory, mention: impl Into<String>) {
        self.0.entry(category).or_default().insert(mention.into());
    }

    pub fn get(&self, category: EntityCategory) -> &BTreeSet<String> {
        self.0.get(&category).unwrap_or(&EMPTY)
    }

    pub fn categories(&self) -> impl Iterator<Item = EntityCategory> + '_ {
        self.0.keys().copied()
    }

    pub fn total_mentions(&self) -> usize {
        self.0.values().map(|s| s.len()).sum()
    }
}

impl Default for EntitySet {
    fn default() -> Self {
        Self::new()
    }
}

/// Output of the narrower severity/improvement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityIndicators {
    pub severity: BTreeSet<String>,
    pub improvement: BTreeSet<String>,
}

/// Sparse per-category changes between two entity sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDiff {
    pub added: BTreeMap<EntityCategory, Vec<String>>,
    pub removed: BTreeMap<EntityCategory, Vec<String>>,
    pub persisting: BTreeMap<EntityCategory, Vec<String>>,
}

impl EntityDiff {
    pub fn added(&self, category: EntityCategory) -> &[String] {
        self.added.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn removed(&self, category: EntityCategory) -> &[String] {
        self.removed.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn persisting(&self, category: EntityCategory) -> &[String] {
        self.persisting.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }
}
