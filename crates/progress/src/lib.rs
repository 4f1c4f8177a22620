pub mod recovery;
pub mod report;

pub use recovery::{RecoveryMetrics, estimate_recovery};
pub use report::{NO_CHANGES_SUMMARY, ProgressReport, synthesize};
