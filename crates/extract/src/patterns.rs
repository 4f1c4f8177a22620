//! Pattern tables for the heuristic medical entity extractor.
//!
//! Order inside each table matters: mentions are collected pattern by
//! pattern, and which group a pattern contributes is fixed per category.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::warn;

/// Which part of a match becomes the mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// The last capture group, or the whole match for group-less patterns.
    LastGroup,
    /// All capture groups joined with a single space.
    JoinGroups,
}

pub struct PatternSet {
    regexes: Vec<Regex>,
    capture: Capture,
}

impl PatternSet {
    /// Compile `sources`, skipping (and logging) any that fail so the rest still run.
    pub fn compile(name: &str, sources: &[&str], capture: Capture) -> Self {
        let regexes = sources
            .iter()
            .filter_map(|src| match Regex::new(src) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(set = name, pattern = src, error = %e, "Skipping invalid pattern");
                    None
                }
            })
            .collect();
        Self { regexes, capture }
    }

    /// Every trimmed, non-empty mention produced by every pattern, in pattern order.
    pub fn mentions<'t>(&'t self, text: &'t str) -> impl Iterator<Item = String> + 't {
        self.regexes.iter().flat_map(move |re| {
            re.captures_iter(text)
                .map(move |caps| self.mention(&caps))
                .filter(|m| !m.is_empty())
        })
    }

    fn mention(&self, caps: &Captures<'_>) -> String {
        let raw = match self.capture {
            Capture::LastGroup => caps
                .get(caps.len() - 1)
                .map_or(String::new(), |m| m.as_str().to_string()),
            Capture::JoinGroups if caps.len() == 1 => caps[0].to_string(),
            Capture::JoinGroups => caps
                .iter()
                .skip(1)
                .map(|g| g.map_or("", |m| m.as_str()))
                .collect::<Vec<_>>()
                .join(" "),
        };
        raw.trim().to_string()
    }

    pub fn len(&self) -> usize {
        self.regexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regexes.is_empty()
    }
}

pub static CONDITIONS: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::compile(
        "conditions",
        &[
            r"(?i)(diagnosed with|suffering from|presents with|history of) ([A-Za-z\s]+)",
            r"(?i)(fracture|tumor|cancer|infection|disease|syndrome|disorder)",
        ],
        Capture::LastGroup,
    )
});

pub static TREATMENTS: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::compile(
        "treatments",
        &[
            r"(?i)(treated with|prescribed|administered) ([A-Za-z\s]+)",
            r"(?i)(surgery|medication|therapy|treatment|procedure|immobilization)",
        ],
        Capture::LastGroup,
    )
});

pub static MEASUREMENTS: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::compile(
        "measurements",
        &[
            r"(?i)(\d+\.?\d*)\s*(mm|cm|ml|mg|kg)",
            r"(?i)(size|volume|measurement|dimension)[:;]\s*([A-Za-z0-9\s\.]+)",
        ],
        Capture::JoinGroups,
    )
});

pub static FINDINGS: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::compile(
        "findings",
        &[
            r"(?i)(observed|noted|found|revealed|shows) ([A-Za-z\s]+)",
            r"(?i)(normal|abnormal|improved|worsened|unchanged)",
        ],
        Capture::LastGroup,
    )
});

pub static RECOVERY: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::compile(
        "recovery_indicators",
        &[
            r"(?i)(healing|recovery|improvement|progress|regrowth|regeneration)",
            r"(?i)(callus formation|bone regrowth|signs of healing)",
            r"(?i)(partial recovery|early healing|slight improvement)",
            r"(?i)(decreased pain|increased mobility|better function)",
        ],
        Capture::LastGroup,
    )
});

pub static SEVERITY: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::compile(
        "severity",
        &[
            r"(?i)(severe|significant|major|extensive|substantial|complete) (fracture|break|damage|injury|disruption)",
            r"(?i)(shows|reveals|indicates) a (?:severe|significant|major) (fracture|break|damage)",
        ],
        Capture::JoinGroups,
    )
});

pub static IMPROVEMENT: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::compile(
        "improvement",
        &[
            r"(?i)(minor|slight|partial|early|promising) (signs of healing|improvement|recovery|bone regrowth)",
            r"(?i)(callus formation|bone regeneration|healing process)",
            r"(?i)(improved|better|recovered|healed) (partially|slightly|significantly|completely)",
        ],
        Capture::JoinGroups,
    )
});
