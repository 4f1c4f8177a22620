use serde::Serialize;
use std::path::Path;
use tracing::{error, info, warn};

use crate::ScanError;
use crate::client::VisionClient;
use crate::format::{ScanFormat, image_data_url, scan_format};
use crate::parse::{is_known_scan_type, normalize_scan_type, parse_anomaly_response, parse_report_response};
use crate::prompt::{CLASSIFY_SCAN_PROMPT, DETECT_ANOMALIES_PROMPT, build_report_prompt};
use crate::render::{dicom_modality, modality_scan_type};

async fn modality_scan_type_of(scan_path: &Path) -> Option<&'static str> {
    if !matches!(scan_format(scan_path), Ok(ScanFormat::Dicom)) {
        return None;
    }

    let path = scan_path.to_path_buf();
    let modality = match tokio::task::spawn_blocking(move || dicom_modality(&path)).await {
        Ok(Ok(modality)) => modality,
        Ok(Err(e)) => {
            warn!(error = %e, "No DICOM modality available");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "DICOM modality lookup aborted");
            return None;
        }
    };

    let scan_type = modality_scan_type(&modality);
    info!(modality = %modality, scan_type = ?scan_type, "Scan type from DICOM modality");
    scan_type
}

pub const UNKNOWN_SCAN_TYPE: &str = "Unknown Scan Type";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub finding_type: String,
    pub description: String,
    pub confidence: Option<f32>,
    pub confidence_text: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyDetection {
    pub anomaly_detected: bool,
    pub analysis: String,
    pub findings: Vec<Finding>,
    pub error: Option<String>,
}

impl AnomalyDetection {
    fn failed(e: &ScanError) -> Self {
        Self {
            anomaly_detected: false,
            analysis: format!("Error occurred during analysis: {}", e),
            findings: Vec::new(),
            error: Some(format!("Error in vision API call: {}", e)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportAnalysis {
    pub report_analysis: String,
    pub findings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanAnalysisResult {
    pub scan_type: String,
    pub anomaly_detection: AnomalyDetection,
    pub report_analysis: Option<ReportAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub vision_client_status: String,
}

#[derive(Debug, Clone)]
pub struct ScanModels {
    pub vision_model: String,
    pub text_model: String,
}

impl Default for ScanModels {
    fn default() -> Self {
        Self {
            vision_model: "llama-3.2-90b-vision-preview".to_string(),
            text_model: "llama-3.2-90b".to_string(),
        }
    }
}

/// Scan classification, anomaly detection and report analysis.
///
/// Every operation degrades to a fallback value instead of failing, so a
/// missing or unreachable vision service never breaks the caller.
pub struct ScanAnalyzer {
    client: Option<VisionClient>,
    models: ScanModels,
}

impl ScanAnalyzer {
    pub fn new(client: Option<VisionClient>, models: ScanModels) -> Self {
        if client.is_none() {
            warn!("No vision API key configured, scan analysis will return fallbacks");
        }
        Self { client, models }
    }

    fn client(&self) -> Result<&VisionClient, ScanError> {
        self.client.as_ref().ok_or(ScanError::ClientNotConfigured)
    }

    /// Vision classification, falling back to the DICOM modality when the model
    /// gives no known type or cannot be reached.
    pub async fn classify_scan_type(&self, scan_path: &Path) -> String {
        let classified = match self.try_classify(scan_path).await {
            Ok(scan_type) if is_known_scan_type(&scan_type) => return scan_type,
            Ok(scan_type) => Some(scan_type),
            Err(e) => {
                error!(error = %e, "Scan classification failed");
                None
            }
        };

        if let Some(scan_type) = modality_scan_type_of(scan_path).await {
            return scan_type.to_string();
        }
        classified.unwrap_or_else(|| UNKNOWN_SCAN_TYPE.to_string())
    }

    async fn try_classify(&self, scan_path: &Path) -> Result<String, ScanError> {
        let client = self.client()?;
        let data_url = image_data_url(scan_path).await?;
        let reply = client
            .ask_about_image(&self.models.vision_model, CLASSIFY_SCAN_PROMPT, data_url, 0.1)
            .await?;

        info!(reply = %reply.trim(), "Scan classification result");
        Ok(normalize_scan_type(&reply))
    }

    pub async fn detect_anomalies(&self, scan_path: &Path) -> AnomalyDetection {
        match self.try_detect(scan_path).await {
            Ok(detection) => detection,
            Err(e) => {
                error!(error = %e, "Anomaly detection failed");
                AnomalyDetection::failed(&e)
            }
        }
    }

    async fn try_detect(&self, scan_path: &Path) -> Result<AnomalyDetection, ScanError> {
        let client = self.client()?;
        let data_url = image_data_url(scan_path).await?;
        let reply = client
            .ask_about_image(&self.models.vision_model, DETECT_ANOMALIES_PROMPT, data_url, 0.5)
            .await?;

        let detection = parse_anomaly_response(&reply);
        info!(
            anomaly_detected = detection.anomaly_detected,
            findings = detection.findings.len(),
            "Anomaly detection complete"
        );
        Ok(detection)
    }

    pub async fn analyze_report(&self, report_text: &str) -> ReportAnalysis {
        match self.try_analyze_report(report_text).await {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(error = %e, "Report analysis failed");
                ReportAnalysis {
                    report_analysis: format!("Error analyzing report: {}", e),
                    findings: Vec::new(),
                }
            }
        }
    }

    async fn try_analyze_report(&self, report_text: &str) -> Result<ReportAnalysis, ScanError> {
        let client = self.client()?;
        let reply = client
            .ask(&self.models.text_model, &build_report_prompt(report_text), 0.2)
            .await?;
        Ok(parse_report_response(&reply))
    }

    /// Full analysis of one scan plus an optional free-text report.
    pub async fn process_scan(&self, scan_path: &Path, report_text: Option<&str>) -> ScanAnalysisResult {
        let scan_type = self.classify_scan_type(scan_path).await;
        let anomaly_detection = self.detect_anomalies(scan_path).await;

        let report_analysis = match report_text.filter(|t| !t.is_empty()) {
            Some(text) => Some(self.analyze_report(text).await),
            None => None,
        };

        ScanAnalysisResult {
            scan_type,
            anomaly_detection,
            report_analysis,
        }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            vision_client_status: if self.client.is_some() { "connected" } else { "not configured" }
                .to_string(),
        }
    }
}
