pub mod schema;
pub mod patterns;
pub mod entities;
pub mod diff;

pub use schema::{EntityCategory, EntityDiff, EntitySet, SeverityIndicators};
pub use entities::{extract_entities, extract_severity_indicators};
pub use diff::diff;
