use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use compare::{ComparisonError, ComparisonOutcome, Comparator};
use ingest::{Document, DocumentType};
use scan::{ALLOWED_SCAN_TYPES, HealthStatus, ScanAnalysisResult, ScanAnalyzer, ScanFormat};
use similarity::{CachedEmbedder, EmbeddingClient};

use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};
use crate::store::{NewReport, ReportPage, ReportStore, StoredReport};

const ALLOWED_DOCUMENT_TYPES: [&str; 6] = ["pdf", "txt", "jpg", "jpeg", "png", "dcm"];

pub struct AppState {
    pub comparator: Comparator,
    pub analyzer: ScanAnalyzer,
    pub store: ReportStore,
    pub metrics: Arc<Metrics>,
    pub embedding_cache: Option<Arc<CachedEmbedder<EmbeddingClient>>>,
}

/// Error body shared by every route: `{"error": ".."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/analyze", post(analyze_scan))
        .route("/api/compare", post(compare_documents))
        .route("/api/compare/text", post(compare_text))
        .route("/api/store-comparison", post(store_comparison))
        .route("/api/patient/:patient_id/reports", get(patient_reports))
        .route("/api/report/:report_id", get(get_report))
        .route("/api/metrics", get(get_metrics))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(state.analyzer.health())
}

async fn analyze_scan(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ScanAnalysisResult>, ApiError> {
    let mut scan_upload: Option<(String, Vec<u8>)> = None;
    let mut report_file: Option<String> = None;
    let mut report_field: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "scan" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = read_bytes(field).await?;
                scan_upload = Some((file_name, bytes));
            }
            "report" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = read_bytes(field).await?;
                // An empty report file field still shadows `report_text`.
                report_file = Some(if file_name.is_empty() {
                    String::new()
                } else {
                    String::from_utf8_lossy(&bytes).into_owned()
                });
            }
            "report_text" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Malformed upload: {}", e)))?;
                report_field = Some(text);
            }
            _ => {}
        }
    }

    let (file_name, bytes) = scan_upload.ok_or_else(|| ApiError::bad_request("No scan file provided"))?;
    if file_name.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }
    let format = ScanFormat::from_file_name(&file_name).ok_or_else(|| {
        ApiError::bad_request(format!("File type not allowed. Supported types: {}", ALLOWED_SCAN_TYPES))
    })?;

    let report_text = report_file.or(report_field);

    // Removed when `staged` drops at the end of the handler.
    let staged = tempfile::Builder::new()
        .prefix("scan-")
        .suffix(&format!(".{}", format.extension()))
        .tempfile()
        .map_err(|e| {
            error!(error = %e, "Failed to stage scan upload");
            ApiError::internal(format!("Processing error: {}", e))
        })?;
    tokio::fs::write(staged.path(), &bytes).await.map_err(|e| {
        error!(error = %e, "Failed to write scan upload");
        ApiError::internal(format!("Processing error: {}", e))
    })?;

    info!(file = %file_name, bytes = bytes.len(), has_report = report_text.is_some(), "Analyzing scan");
    let timer = TimedOperation::start();
    let result = state
        .analyzer
        .process_scan(staged.path(), report_text.as_deref())
        .await;

    state.metrics.record_analysis(timer.elapsed());
    state.metrics.record_request(result.anomaly_detection.error.is_none());

    Ok(Json(result))
}

async fn compare_documents(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ComparisonOutcome>, ApiError> {
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed upload: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file_name.is_empty() {
            continue;
        }
        if !allowed_document(&file_name) {
            return Err(ApiError::bad_request(format!(
                "File type not allowed. Supported types: {}",
                ALLOWED_DOCUMENT_TYPES.join(", ")
            )));
        }

        let bytes = read_bytes(field).await?;
        documents.push(Document::from_upload(file_name, bytes));
    }

    run_comparison(&state, documents).await
}

#[derive(Debug, Deserialize)]
struct TextDocument {
    name: String,
    #[serde(rename = "type", default)]
    doc_type: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompareTextRequest {
    documents: Vec<TextDocument>,
}

async fn compare_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompareTextRequest>,
) -> Result<Json<ComparisonOutcome>, ApiError> {
    let documents = req
        .documents
        .into_iter()
        .map(|d| Document::from_text(d.name, DocumentType::from_extension(&d.doc_type), d.content))
        .collect();

    run_comparison(&state, documents).await
}

async fn run_comparison(state: &AppState, documents: Vec<Document>) -> Result<Json<ComparisonOutcome>, ApiError> {
    if documents.len() < 2 {
        state.metrics.record_request(false);
        return Err(ApiError::bad_request(ComparisonError::InsufficientDocuments.to_string()));
    }

    let timer = TimedOperation::start();
    let outcome = state.comparator.compare(&documents).await;

    state.metrics.record_comparison(timer.elapsed(), documents.len());
    state.metrics.record_request(outcome.is_success());

    Ok(Json(outcome))
}

async fn store_comparison(
    State(state): State<Arc<AppState>>,
    Json(report): Json<NewReport>,
) -> Result<(StatusCode, Json<StoredReport>), ApiError> {
    match state.store.save(report).await {
        Ok(stored) => Ok((StatusCode::CREATED, Json(stored))),
        Err(e) => {
            error!(error = %format!("{:#}", e), "Failed to store comparison");
            Err(ApiError::internal("Failed to store comparison"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct Paging {
    limit: Option<usize>,
    skip: Option<usize>,
}

async fn patient_reports(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    Query(paging): Query<Paging>,
) -> Result<Json<ReportPage>, ApiError> {
    let limit = paging.limit.unwrap_or(10);
    let skip = paging.skip.unwrap_or(0);

    state
        .store
        .list_for_patient(&patient_id, limit, skip)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %format!("{:#}", e), patient_id = %patient_id, "Failed to list reports");
            ApiError::internal("Failed to list reports")
        })
}

async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
) -> Result<Json<StoredReport>, ApiError> {
    match state.store.get(&report_id).await {
        Ok(Some(report)) => Ok(Json(report)),
        Ok(None) => Err(ApiError::not_found("Report not found")),
        Err(e) => {
            error!(error = %format!("{:#}", e), report_id = %report_id, "Failed to read report");
            Err(ApiError::internal("Failed to read report"))
        }
    }
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    let mut snapshot = state.metrics.snapshot();
    snapshot.embeddings_cached = state
        .embedding_cache
        .as_ref()
        .map(|cache| cache.stats().embeddings_cached);
    Json(snapshot)
}

async fn read_bytes(field: axum::extract::multipart::Field<'_>) -> Result<Vec<u8>, ApiError> {
    field.bytes().await.map(|b| b.to_vec()).map_err(|e| {
        warn!(error = %e, "Failed to read upload bytes");
        ApiError::bad_request("Failed to read file data")
    })
}

fn allowed_document(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_DOCUMENT_TYPES.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
