pub const CLASSIFY_SCAN_PROMPT: &str = "What type of medical scan is this? Please respond with exactly one of the following options: CT Scan, MRI Scan, X-ray, Ultrasound, PET Scan, or Other (specify if possible). Only respond with the scan type.";

pub const DETECT_ANOMALIES_PROMPT: &str = r#"Analyze this medical scan for anomalies. Follow this format exactly:
1. Start with either "ANOMALY: YES" or "ANOMALY: NO"
2. Provide a detailed medical explanation
3. If anomaly exists, list under FINDINGS: describing location and nature of each anomaly
4. If no anomaly, explain why the scan appears normal"#;

pub fn build_report_prompt(report_text: &str) -> String {
    format!(
        r#"Analyze this medical report and extract key findings.
The report is: {}

Format your response as follows:
1. Start with "SUMMARY:" followed by a brief 1-2 sentence summary
2. Then "KEY FINDINGS:" followed by a bullet list of important medical observations
3. Do not include any other information."#,
        report_text
    )
}
