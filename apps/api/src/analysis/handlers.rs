//! Axum route handlers for the Analysis API.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::analysis::extract::{extract_text, DocumentKind};
use crate::analysis::heuristic::normalize_job_role;
use crate::analysis::synthesizer::DEFAULT_ANALYSIS_TYPE;
use crate::errors::AppError;
use crate::models::analysis::{ResumeAnalysisRow, ScoreTrendRow, UserAnalyticsRow};
use crate::state::AppState;
use crate::store::recorder::record_analysis;
use crate::store::NewAnalysis;

/// Resumes shorter than this (trimmed, in characters) are rejected before analysis.
pub const MIN_RESUME_CHARS: usize = 100;
const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub user_id: Uuid,
    pub resume_text: String,
    #[serde(default)]
    pub job_role: Option<String>,
    #[serde(default)]
    pub analysis_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub user_id: Uuid,
    pub limit: Option<i64>,
}

impl PageQuery {
    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis_id: Uuid,
    pub job_role: String,
    pub analysis_type: String,
    pub created_at: DateTime<Utc>,
    pub result: Value,
}

impl From<ResumeAnalysisRow> for AnalysisResponse {
    fn from(row: ResumeAnalysisRow) -> Self {
        // source_tier stays server-side
        Self {
            analysis_id: row.id,
            job_role: row.job_role,
            analysis_type: row.analysis_type,
            created_at: row.created_at,
            result: row.result,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    pub analysis_id: Uuid,
    pub job_role: String,
    pub analysis_type: String,
    pub ats_score: i32,
    pub overall_score: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ResumeAnalysisRow> for AnalysisSummary {
    fn from(row: ResumeAnalysisRow) -> Self {
        Self {
            analysis_id: row.id,
            job_role: row.job_role,
            analysis_type: row.analysis_type,
            ats_score: row.ats_score,
            overall_score: row.overall_score,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsView {
    #[serde(flatten)]
    pub row: UserAnalyticsRow,
    pub average_overall_score: f64,
    pub overall_delta: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub analytics: Option<AnalyticsView>,
    pub trends: Vec<ScoreTrendRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyses
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let response = run_analysis(
        &state,
        request.user_id,
        &request.resume_text,
        request.job_role.as_deref(),
        request.analysis_type.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/analyses/upload
///
/// Multipart form: `file` (PDF or plain text), `user_id`, optional `job_role`
/// and `analysis_type`.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let mut resume_text: Option<String> = None;
    let mut user_id: Option<Uuid> = None;
    let mut job_role: Option<String> = None;
    let mut analysis_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let kind = DocumentKind::detect(field.content_type(), field.file_name())?;
                let bytes = field.bytes().await.map_err(multipart_error)?;
                resume_text = Some(extract_upload(kind, bytes).await?);
            }
            "user_id" => {
                let raw = field.text().await.map_err(multipart_error)?;
                user_id = Some(
                    Uuid::parse_str(raw.trim())
                        .map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))?,
                );
            }
            "job_role" => job_role = Some(field.text().await.map_err(multipart_error)?),
            "analysis_type" => analysis_type = Some(field.text().await.map_err(multipart_error)?),
            _ => {} // ignore unknown fields
        }
    }

    let user_id = user_id.ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;
    let resume_text =
        resume_text.ok_or_else(|| AppError::Validation("file is required".to_string()))?;

    let response = run_analysis(
        &state,
        user_id,
        &resume_text,
        job_role.as_deref(),
        analysis_type.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/analyses
pub async fn handle_list_analyses(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Vec<AnalysisSummary>>, AppError> {
    let rows = state
        .store
        .list_analyses(params.user_id, params.limit())
        .await?;
    Ok(Json(rows.into_iter().map(AnalysisSummary::from).collect()))
}

/// GET /api/v1/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let row = state
        .store
        .get_analysis(params.user_id, analysis_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {analysis_id} not found")))?;
    Ok(Json(row.into()))
}

/// GET /api/v1/analytics
pub async fn handle_get_analytics(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let analytics = state
        .store
        .get_user_analytics(params.user_id)
        .await?
        .map(|row| AnalyticsView {
            average_overall_score: row.average_overall_score(),
            overall_delta: row.overall_delta(),
            row,
        });
    let trends = state
        .store
        .list_trends(params.user_id, params.limit())
        .await?;

    Ok(Json(AnalyticsResponse { analytics, trends }))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared pipeline
// ────────────────────────────────────────────────────────────────────────────

async fn run_analysis(
    state: &AppState,
    user_id: Uuid,
    resume_text: &str,
    job_role: Option<&str>,
    analysis_type: Option<&str>,
) -> Result<AnalysisResponse, AppError> {
    validate_resume_text(resume_text)?;

    let job_role = normalize_job_role(job_role);
    let analysis_type = analysis_type
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_ANALYSIS_TYPE);

    let synthesis = state
        .synthesizer
        .synthesize(resume_text, Some(&job_role), analysis_type)
        .await?;

    let row = record_analysis(
        state.store.as_ref(),
        NewAnalysis {
            user_id,
            job_role: &job_role,
            analysis_type,
            result: &synthesis.result,
            tier: synthesis.tier,
        },
    )
    .await?;

    Ok(row.into())
}

/// Text extraction off the async executor. A panic inside the PDF parser
/// surfaces as an internal error.
async fn extract_upload(kind: DocumentKind, bytes: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in text extraction: {e}"))
        })??;
    Ok(text)
}

fn validate_resume_text(resume_text: &str) -> Result<(), AppError> {
    let chars = resume_text.trim().chars().count();
    if chars < MIN_RESUME_CHARS {
        return Err(AppError::Validation(format!(
            "resume text is too short ({chars} characters, minimum {MIN_RESUME_CHARS})"
        )));
    }
    Ok(())
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(e.body_text())
    }
}
