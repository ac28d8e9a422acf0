//! Axum route handlers for the optimization API.

use std::collections::BTreeSet;

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::gap_decision::{ClarificationRequest, GapDecision};
use crate::analysis::interaction::{HumanInteraction, PresetAnswers};
use crate::analysis::pipeline::{Analysis, RunResult};
use crate::analysis::synthesis::SynthesizedResume;
use crate::documents::extract_pdf_text;
use crate::errors::AppError;
use crate::sessions::{AnalysisSession, UploadedResume};
use crate::state::AppState;

/// Multipart field carrying the résumé PDF.
pub const RESUME_FIELD: &str = "resume";

/// Reported when the model scored no individual skills.
const DEFAULT_SKILLS_MATCH: u8 = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub resume_id: Uuid,
    pub filename: String,
    pub characters: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub resume_id: Uuid,
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis_id: Uuid,
    pub overall_match: u8,
    pub skills_match: u8,
    pub recommendations: Vec<String>,
    pub sufficient: bool,
    pub clarification: Option<ClarificationRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub confirmed_skills: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub analysis_id: Uuid,
    pub version: u32,
    pub resume: SynthesizedResume,
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub job_description: String,
    pub resume_text: String,
    /// Answers collected up front; used only if clarification is warranted.
    pub confirmed_skills: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub analysis_id: Uuid,
    pub sufficient: bool,
    pub has_optimized_resume: bool,
    pub resume_versions: usize,
    pub created_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/upload
///
/// Accepts a PDF in the `resume` multipart field and stores its text.
/// The declared content type is ignored; the bytes must carry the PDF header.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("resume.pdf").to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        let text = extract_pdf_text(content).await?;
        let upload = UploadedResume {
            id: Uuid::new_v4(),
            filename,
            text,
            uploaded_at: Utc::now(),
        };
        let response = UploadResponse {
            resume_id: upload.id,
            filename: upload.filename.clone(),
            characters: upload.text.chars().count(),
        };

        info!(
            "Stored résumé {} ({} characters)",
            response.resume_id, response.characters
        );
        state.sessions.put_upload(upload).await?;
        return Ok(Json(response));
    }

    Err(AppError::Validation(format!(
        "multipart field '{RESUME_FIELD}' is required"
    )))
}

/// POST /api/v1/analyses
///
/// Runs job extraction, matching and the gap decision for an uploaded résumé.
/// When clarification is warranted the response carries the skills to ask about.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }

    let upload = state
        .sessions
        .upload(request.resume_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Résumé {} not found", request.resume_id)))?;

    let analysis = state
        .pipeline
        .analyze(&request.job_description, &upload.text)
        .await?;

    let analysis_id = Uuid::new_v4();
    let response = analyze_response(analysis_id, &analysis);

    state
        .sessions
        .put_analysis(AnalysisSession::new(
            analysis_id,
            Some(upload.id),
            request.job_description,
            analysis,
        ))
        .await?;

    Ok(Json(response))
}

/// POST /api/v1/analyses/:id/resume
///
/// Synthesizes a résumé for a stored analysis using the candidate's answers.
pub async fn handle_generate_resume(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let session = state
        .sessions
        .analysis(analysis_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Analysis {analysis_id} not found")))?;

    let confirmed = clean_skills(request.confirmed_skills);
    let resume = state
        .pipeline
        .synthesize(
            &session.analysis.profile,
            &session.analysis.report,
            Some(&confirmed),
        )
        .await?;

    let version = state
        .sessions
        .append_resume(analysis_id, confirmed, resume.clone())
        .await?;

    Ok(Json(GenerateResponse {
        analysis_id,
        version,
        resume,
    }))
}

/// POST /api/v1/optimize
///
/// One-shot run. Pre-supplied `confirmed_skills` answer any clarification round.
/// The run id doubles as the analysis id for status and download.
pub async fn handle_optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<RunResult>, AppError> {
    if request.job_description.trim().is_empty() || request.resume_text.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description and resume_text cannot be empty".to_string(),
        ));
    }

    let answers = request.confirmed_skills.map(PresetAnswers::new);
    let result = state
        .pipeline
        .run(
            &request.job_description,
            &request.resume_text,
            answers.as_ref().map(|a| a as &dyn HumanInteraction),
        )
        .await?;

    let session = AnalysisSession::new(
        result.run_id,
        None,
        request.job_description,
        Analysis {
            profile: result.profile.clone(),
            report: result.report.clone(),
            decision: GapDecision {
                sufficient: result.request.is_none(),
                request: result.request.clone(),
            },
        },
    );
    state.sessions.put_analysis(session).await?;
    state
        .sessions
        .append_resume(
            result.run_id,
            result.confirmed_skills.clone().unwrap_or_default(),
            result.resume.clone(),
        )
        .await?;

    Ok(Json(result))
}

/// GET /api/v1/analyses/:id
pub async fn handle_analysis_status(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    let session = state
        .sessions
        .analysis(analysis_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Analysis {analysis_id} not found")))?;

    Ok(Json(StatusResponse {
        analysis_id,
        sufficient: session.analysis.decision.sufficient,
        has_optimized_resume: session.latest_resume().is_some(),
        resume_versions: session.versions.len(),
        created_at: session.created_at,
    }))
}

/// GET /api/v1/analyses/:id/download
///
/// Latest synthesized résumé as a JSON attachment, ready for template rendering.
pub async fn handle_download_resume(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let session = state
        .sessions
        .analysis(analysis_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Analysis {analysis_id} not found")))?;

    let latest = session.latest_resume().ok_or_else(|| {
        AppError::NotFound(format!("No optimized résumé for analysis {analysis_id}"))
    })?;

    let disposition = format!("attachment; filename=\"optimized_resume_{analysis_id}.json\"");
    Ok((
        [(header::CONTENT_DISPOSITION, disposition)],
        Json(latest.resume.clone()),
    )
        .into_response())
}

fn analyze_response(analysis_id: Uuid, analysis: &Analysis) -> AnalyzeResponse {
    AnalyzeResponse {
        analysis_id,
        overall_match: analysis.report.overall_score,
        skills_match: analysis
            .report
            .best_skill_percent()
            .unwrap_or(DEFAULT_SKILLS_MATCH),
        recommendations: analysis.report.recommendations.clone(),
        sufficient: analysis.decision.sufficient,
        clarification: analysis.decision.request.clone(),
    }
}

fn clean_skills(skills: Vec<String>) -> BTreeSet<String> {
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{platform_profile, report};

    #[test]
    fn test_analyze_response_scales_best_skill() {
        let analysis = Analysis {
            profile: platform_profile(),
            report: report(62, &[("Python", 7), ("Kubernetes", 1)], &["Kubernetes"]),
            decision: GapDecision::clarify(ClarificationRequest {
                rationale: "No Kubernetes".to_string(),
                missing_skills: vec!["Kubernetes".to_string()],
            }),
        };
        let response = analyze_response(Uuid::nil(), &analysis);
        assert_eq!(response.overall_match, 62);
        assert_eq!(response.skills_match, 70);
        assert!(!response.sufficient);
        assert_eq!(response.clarification.unwrap().missing_skills, vec!["Kubernetes"]);
    }

    #[test]
    fn test_analyze_response_defaults_skills_match() {
        let analysis = Analysis {
            profile: platform_profile(),
            report: report(80, &[], &[]),
            decision: GapDecision::sufficient(),
        };
        assert_eq!(analyze_response(Uuid::nil(), &analysis).skills_match, DEFAULT_SKILLS_MATCH);
    }

    #[test]
    fn test_clean_skills_trims_and_drops_blanks() {
        let cleaned = clean_skills(vec![" Kubernetes ".to_string(), "".to_string(), "Go".to_string()]);
        assert_eq!(cleaned.len(), 2);
        assert!(cleaned.contains("Kubernetes"));
    }

    #[test]
    fn test_optimize_request_without_confirmations() {
        let json = serde_json::json!({
            "job_description": "Platform Engineer",
            "resume_text": "Python developer"
        });
        let request: OptimizeRequest = serde_json::from_value(json).unwrap();
        assert!(request.confirmed_skills.is_none());
    }
}
