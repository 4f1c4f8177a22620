pub mod analysis;
pub mod client;
pub mod format;
pub mod parse;
pub mod prompt;
pub mod render;
pub mod retry;

pub use analysis::{
    AnomalyDetection, Finding, HealthStatus, ReportAnalysis, ScanAnalysisResult, ScanAnalyzer, ScanModels,
    UNKNOWN_SCAN_TYPE,
};
pub use client::VisionClient;
pub use format::{ALLOWED_SCAN_TYPES, ScanFormat, image_data_url, scan_format};
pub use retry::RetryPolicy;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Vision client not configured")]
    ClientNotConfigured,

    #[error("Unsupported scan format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Vision request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Vision API returned {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to render scan: {0}")]
    Render(String),

    #[error("Vision API returned no content")]
    EmptyResponse,
}

impl ScanError {
    /// Connection failures, rate limiting and server errors are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ScanError::Request(_) => true,
            ScanError::Status(status) => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
