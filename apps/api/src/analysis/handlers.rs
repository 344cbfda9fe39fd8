//! Axum route handlers for the Analysis API.

use std::time::{Duration, Instant};

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::batch::{BatchReport, BatchState};
use crate::errors::AppError;
use crate::ingest::decode_document;
use crate::models::analysis::{AnalysisRecord, ResumeInput, Verdict};
use crate::state::AppState;

const JOB_DESCRIPTION_FIELD: &str = "job_description";
const RESUME_FIELD: &str = "resumes";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub job_description: String,
    pub resumes: Vec<ResumeInput>,
}

/// Aggregates for the results view. Derived from the records, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub average_score: u8,
}

impl BatchStats {
    pub fn from_records(records: &[AnalysisRecord]) -> Self {
        let count = |verdict: Verdict| records.iter().filter(|r| r.verdict == verdict).count();
        let average_score = if records.is_empty() {
            0
        } else {
            let sum: usize = records.iter().map(|r| r.score as usize).sum();
            ((sum as f64 / records.len() as f64).round() as usize).min(100) as u8
        };

        Self {
            total: records.len(),
            high: count(Verdict::High),
            medium: count(Verdict::Medium),
            low: count(Verdict::Low),
            average_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub batch_id: Uuid,
    pub state: BatchState,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub required_skills: Vec<String>,
    pub stats: BatchStats,
    pub results: Vec<AnalysisRecord>,
}

impl From<BatchReport> for AnalyzeResponse {
    fn from(report: BatchReport) -> Self {
        Self {
            stats: BatchStats::from_records(&report.records),
            batch_id: report.batch_id,
            state: report.state,
            started_at: report.started_at,
            completed_at: report.completed_at,
            required_skills: report.required_skills,
            results: report.records,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkillsResponse {
    pub count: usize,
    pub skills: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/skills
///
/// Returns the active skill vocabulary in display order.
pub async fn handle_list_skills(State(state): State<AppState>) -> Json<SkillsResponse> {
    let skills = state.analyzer.dictionary().terms().to_vec();
    Json(SkillsResponse {
        count: skills.len(),
        skills,
    })
}

/// POST /api/v1/analyses
///
/// Analyzes already-decoded resume texts against a job description and
/// returns the ranked records with batch statistics.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    validate_batch(&state, &request.job_description, request.resumes.len())?;
    let report = run_batch(&state, request.job_description, request.resumes).await?;
    Ok(Json(report.into()))
}

/// POST /api/v1/analyses/upload
///
/// Multipart variant: one `job_description` text field and any number of
/// `resumes` file fields (PDF, DOCX or plain text). Files that fail to decode
/// still produce a record, flagged for manual review.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut job_description = String::new();
    let mut uploads: Vec<(String, Bytes)> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(unreadable_upload)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some(JOB_DESCRIPTION_FIELD) => {
                job_description = field.text().await.map_err(unreadable_upload)?;
            }
            Some(RESUME_FIELD) => {
                if uploads.len() >= state.config.max_resumes_per_batch {
                    return Err(too_many_resumes(state.config.max_resumes_per_batch));
                }
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("resume-{}", uploads.len() + 1));
                let data = field.bytes().await.map_err(unreadable_upload)?;
                uploads.push((file_name, data));
            }
            _ => {}
        }
    }

    validate_batch(&state, &job_description, uploads.len())?;
    info!("Received {} resume upload(s)", uploads.len());

    let resumes = tokio::task::spawn_blocking(move || {
        uploads
            .iter()
            .map(|(name, data)| decode_document(name, data))
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("document decoding task failed: {e}")))?;

    let report = run_batch(&state, job_description, resumes).await?;
    Ok(Json(report.into()))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn validate_batch(state: &AppState, job_description: &str, resume_count: usize) -> Result<(), AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    if resume_count == 0 {
        return Err(AppError::Validation(
            "at least one resume is required".to_string(),
        ));
    }
    if resume_count > state.config.max_resumes_per_batch {
        return Err(too_many_resumes(state.config.max_resumes_per_batch));
    }
    Ok(())
}

fn too_many_resumes(limit: usize) -> AppError {
    AppError::Validation(format!("a batch may contain at most {limit} resumes"))
}

fn unreadable_upload(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::UnprocessableEntity(format!("unreadable upload: {e}"))
}

/// Runs the batch on the blocking pool under the configured wall-clock budget.
async fn run_batch(
    state: &AppState,
    job_description: String,
    resumes: Vec<ResumeInput>,
) -> Result<BatchReport, AppError> {
    let deadline = state
        .config
        .batch_timeout_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let analyzer = state.analyzer.clone();

    tokio::task::spawn_blocking(move || match deadline {
        Some(_) => analyzer.analyze_batch_until(&job_description, &resumes, deadline),
        None => analyzer.analyze_batch(&job_description, &resumes),
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("batch task failed: {e}")))
}
