use crate::analysis::{AnomalyDetection, Finding, ReportAnalysis};

const COMMON_SCAN_TYPES: [&str; 5] = ["CT Scan", "MRI Scan", "X-ray", "Ultrasound", "PET Scan"];

const DEFAULT_SUMMARY: &str = "Report analysis completed";
const NO_REPORT_FINDINGS: &str = "No specific findings extracted from report";
const VISUAL_CONFIDENCE: &str = "Based on visual analysis";

pub fn is_known_scan_type(scan_type: &str) -> bool {
    COMMON_SCAN_TYPES.contains(&scan_type)
}

/// Map a free-form classification reply onto a known scan type.
pub fn normalize_scan_type(response: &str) -> String {
    let reply = response.trim();
    let lower = reply.to_lowercase();
    COMMON_SCAN_TYPES
        .iter()
        .find(|t| lower.contains(&t.to_lowercase()))
        .map(|t| t.to_string())
        .unwrap_or_else(|| reply.to_string())
}

pub fn parse_anomaly_response(response: &str) -> AnomalyDetection {
    let anomaly_detected = response.to_uppercase().contains("ANOMALY: YES");

    let mut findings = Vec::new();
    if anomaly_detected {
        if let Some(section) = response.split("FINDINGS:").nth(1) {
            findings = section
                .trim()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .enumerate()
                .map(|(i, line)| Finding::visual(format!("Finding {}", i + 1), line.to_string()))
                .collect();
        }

        if findings.is_empty() {
            findings.push(Finding::visual(
                "potential anomaly".to_string(),
                "See full analysis for details".to_string(),
            ));
        }
    }

    AnomalyDetection {
        anomaly_detected,
        analysis: response.to_string(),
        findings,
        error: None,
    }
}

pub fn parse_report_response(response: &str) -> ReportAnalysis {
    let mut findings: Vec<String> = response
        .split("KEY FINDINGS:")
        .nth(1)
        .map(|section| {
            section
                .trim()
                .lines()
                .map(|line| strip_list_marker(line.trim()))
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if findings.is_empty() {
        findings.push(NO_REPORT_FINDINGS.to_string());
    }

    let report_analysis = match response.split("SUMMARY:").nth(1) {
        Some(section) => {
            let section = section.trim();
            match section.split_once("KEY FINDINGS:") {
                Some((summary, _)) => summary.trim().to_string(),
                None => section.to_string(),
            }
        }
        None => DEFAULT_SUMMARY.to_string(),
    };

    ReportAnalysis {
        report_analysis,
        findings,
    }
}

/// Drop a leading `-`, `•`, `*`, `N. ` or `N) ` marker up to the first space.
fn strip_list_marker(line: &str) -> &str {
    let mut chars = line.chars();
    let is_marked = match chars.next() {
        Some('-' | '•' | '*') => true,
        Some(c) if c.is_ascii_digit() => {
            let rest = chars.as_str();
            rest.starts_with(". ") || rest.starts_with(") ")
        }
        _ => false,
    };

    if !is_marked {
        return line;
    }
    match line.find(' ') {
        Some(i) => line[i + 1..].trim(),
        None => line,
    }
}

impl Finding {
    fn visual(finding_type: String, description: String) -> Self {
        Self {
            finding_type,
            description,
            confidence: None,
            confidence_text: Some(VISUAL_CONFIDENCE.to_string()),
            location: None,
        }
    }
}
