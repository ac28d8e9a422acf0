//! Job requirement analysis — extracts a structured `JobProfile` from a raw posting.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::prompts::{JOB_PROFILE_ROLE, JOB_PROFILE_SCHEMA, JOB_PROFILE_TEMPLATE};
use crate::analysis::{fill_template, AnalysisFailed, Stage};
use crate::extraction::{Extractor, Validate};
use crate::llm_client::prompts::json_system;

/// Extraction is near-deterministic.
pub const JOB_PROFILE_TEMPERATURE: f32 = 0.0;

/// Structured recruiting signal from a job posting.
///
/// The first five fields are required in model output; the softer signals
/// default to empty when the model leaves them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProfile {
    pub title: String,
    pub required_skills: BTreeSet<String>,
    pub preferred_skills: BTreeSet<String>,
    pub responsibilities: Vec<String>,
    pub ats_keywords: BTreeSet<String>,
    #[serde(default)]
    pub company_type: String,
    #[serde(default)]
    pub work_environment: Vec<String>,
    #[serde(default)]
    pub tone_of_voice: String,
    #[serde(default)]
    pub culture_signals: Vec<String>,
    #[serde(default)]
    pub technical_domains: Vec<String>,
    #[serde(default)]
    pub urgency: String,
    #[serde(default)]
    pub remote_policy: String,
}

impl Validate for JobProfile {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        Ok(())
    }
}

/// Extracts a `JobProfile` from posting text.
pub async fn analyze_job(
    posting_text: &str,
    extractor: &Extractor,
) -> Result<JobProfile, AnalysisFailed> {
    let system = json_system(&format!("{JOB_PROFILE_ROLE}\n\n{JOB_PROFILE_SCHEMA}"));
    let prompt = fill_template(JOB_PROFILE_TEMPLATE, &[("posting", posting_text.trim())]);

    let profile: JobProfile = extractor
        .extract(&system, &prompt, JOB_PROFILE_TEMPERATURE)
        .await
        .map_err(AnalysisFailed::at(Stage::Job))?;

    info!(
        "Job profile extracted: title={:?}, required={}, preferred={}",
        profile.title,
        profile.required_skills.len(),
        profile.preferred_skills.len()
    );
    Ok(profile)
}
