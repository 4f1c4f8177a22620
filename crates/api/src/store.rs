use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

pub const UNASSIGNED_PATIENT: &str = "unassigned";

/// Body of a store request, as posted by the comparison page.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
    pub patient_id: Option<String>,
    #[serde(rename = "comparisonResult")]
    pub comparison_result: serde_json::Value,
    #[serde(rename = "documentNames", default)]
    pub document_names: Vec<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    #[serde(rename = "_id")]
    pub id: String,
    pub patient_id: String,
    #[serde(rename = "comparisonResult")]
    pub comparison_result: serde_json::Value,
    #[serde(rename = "documentNames")]
    pub document_names: Vec<String>,
    pub timestamp: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReportPage {
    pub reports: Vec<StoredReport>,
    pub limit: usize,
    pub skip: usize,
    pub total: usize,
}

/// One JSON file per stored comparison under `<data_dir>/reports`.
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().join("reports"),
        }
    }

    pub async fn save(&self, report: NewReport) -> Result<StoredReport> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("Failed to create report directory")?;

        let stored = StoredReport {
            id: Uuid::new_v4().to_string(),
            patient_id: report
                .patient_id
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| UNASSIGNED_PATIENT.to_string()),
            comparison_result: report.comparison_result,
            document_names: report.document_names,
            timestamp: report.timestamp,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string_pretty(&stored)?;
        tokio::fs::write(self.path_for(&stored.id), json)
            .await
            .context("Failed to write report")?;

        info!(report_id = %stored.id, patient_id = %stored.patient_id, "Stored comparison report");
        Ok(stored)
    }

    pub async fn get(&self, id: &str) -> Result<Option<StoredReport>> {
        // Ids are always UUIDs; anything else cannot name a stored file.
        if Uuid::parse_str(id).is_err() {
            return Ok(None);
        }

        match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json).context("Corrupt report file")?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read report"),
        }
    }

    /// A patient's reports, newest first.
    pub async fn list_for_patient(&self, patient_id: &str, limit: usize, skip: usize) -> Result<ReportPage> {
        let mut reports = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => Some(entries),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e).context("Failed to list reports"),
        };

        if let Some(entries) = entries.as_mut() {
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }

                let json = tokio::fs::read_to_string(&path).await?;
                match serde_json::from_str::<StoredReport>(&json) {
                    Ok(report) if report.patient_id == patient_id => reports.push(report),
                    Ok(_) => {}
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable report"),
                }
            }
        }

        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = reports.len();
        let reports = reports.into_iter().skip(skip).take(limit).collect();

        Ok(ReportPage {
            reports,
            limit,
            skip,
            total,
        })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }
}
