//! Gap decision — decides whether a match is good enough to synthesize directly
//! or whether the candidate should first be asked about missing skills.
//!
//! Two cheap checks run before any model call:
//! 1. `overall_score >= threshold` → sufficient.
//! 2. No candidate gaps (low skill scores ∪ reported gaps) and
//!    `overall_score >= adequacy_floor` → sufficient.
//!
//! Otherwise the model drafts a clarification, which is sanitized before use.
//! A failed draft degrades to "sufficient": clarification is a refinement,
//! never a requirement.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::job_profile::JobProfile;
use crate::analysis::match_report::MatchReport;
use crate::analysis::prompts::{CLARIFICATION_ROLE, CLARIFICATION_SCHEMA, CLARIFICATION_TEMPLATE};
use crate::analysis::{bullet_list, fill_template};
use crate::extraction::{Extractor, Validate};
use crate::llm_client::prompts::json_system;

/// Slightly above zero so the model can phrase the rationale.
pub const CLARIFICATION_TEMPERATURE: f32 = 0.2;

/// Tunable thresholds for the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapPolicy {
    /// Scores at or above this never trigger clarification.
    pub threshold: u8,
    /// Scores at or above this with no concrete gap are accepted.
    pub adequacy_floor: u8,
    /// Skill scores at or below this count as gaps.
    pub low_skill_score: u8,
    /// Max skills in one clarification request.
    pub max_missing: usize,
    /// Skill names shorter than this (after trimming) are dropped.
    pub min_skill_chars: usize,
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            threshold: 75,
            adequacy_floor: 65,
            low_skill_score: 3,
            max_missing: 5,
            min_skill_chars: 3,
        }
    }
}

/// Skills the candidate is asked to confirm, with the model's reasoning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    pub rationale: String,
    pub missing_skills: Vec<String>,
}

/// Raw model draft, before sanitizing.
#[derive(Debug, Deserialize)]
struct ClarificationDraft {
    #[serde(default, alias = "overall_analysis")]
    rationale: String,
    missing_skills: Vec<String>,
}

impl Validate for ClarificationDraft {}

/// Outcome of `GapDecisionEngine::decide`. `request` is present iff not sufficient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapDecision {
    pub sufficient: bool,
    pub request: Option<ClarificationRequest>,
}

impl GapDecision {
    pub fn sufficient() -> Self {
        Self {
            sufficient: true,
            request: None,
        }
    }

    pub fn clarify(request: ClarificationRequest) -> Self {
        Self {
            sufficient: false,
            request: Some(request),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GapDecisionEngine {
    policy: GapPolicy,
}

impl GapDecisionEngine {
    pub fn new(policy: GapPolicy) -> Self {
        Self { policy }
    }

    pub async fn decide(
        &self,
        report: &MatchReport,
        profile: &JobProfile,
        extractor: &Extractor,
    ) -> GapDecision {
        let score = report.overall_score;

        if score >= self.policy.threshold {
            info!(
                "Score {score} >= {}: no clarification needed",
                self.policy.threshold
            );
            return GapDecision::sufficient();
        }

        let gaps = candidate_gaps(report, &self.policy);
        if gaps.is_empty() && score >= self.policy.adequacy_floor {
            info!("No concrete gaps and score {score} is adequate: skipping clarification");
            return GapDecision::sufficient();
        }

        let system = json_system(&format!("{CLARIFICATION_ROLE}\n\n{CLARIFICATION_SCHEMA}"));
        let prompt = build_clarification_prompt(report, profile, &gaps);

        let draft: ClarificationDraft = match extractor
            .extract(&system, &prompt, CLARIFICATION_TEMPERATURE)
            .await
        {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Clarification draft failed, treating match as sufficient: {e}");
                return GapDecision::sufficient();
            }
        };

        let missing_skills = sanitize_missing_skills(draft.missing_skills, &self.policy);
        if missing_skills.is_empty() {
            info!("No actionable missing skills surfaced: treating match as sufficient");
            return GapDecision::sufficient();
        }

        info!(
            "Clarification needed for {} skills: {:?}",
            missing_skills.len(),
            missing_skills
        );
        GapDecision::clarify(ClarificationRequest {
            rationale: draft.rationale.trim().to_string(),
            missing_skills,
        })
    }
}

/// Skills scored at or below `low_skill_score`, plus the reported gaps.
pub fn candidate_gaps(report: &MatchReport, policy: &GapPolicy) -> BTreeSet<String> {
    report
        .skill_scores
        .iter()
        .filter(|(_, score)| **score <= policy.low_skill_score)
        .map(|(skill, _)| skill)
        .chain(report.skill_gaps.iter())
        .map(|skill| skill.trim())
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trims, drops short or blank names and case-insensitive duplicates, then caps the list.
pub fn sanitize_missing_skills(raw: Vec<String>, policy: &GapPolicy) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|skill| skill.trim().to_string())
        .filter(|skill| skill.chars().count() >= policy.min_skill_chars)
        .filter(|skill| seen.insert(skill.to_lowercase()))
        .take(policy.max_missing)
        .collect()
}

fn build_clarification_prompt(
    report: &MatchReport,
    profile: &JobProfile,
    gaps: &BTreeSet<String>,
) -> String {
    let skill_scores = serde_json::to_string(&report.skill_scores).unwrap_or_default();

    fill_template(
        CLARIFICATION_TEMPLATE,
        &[
            ("required", &bullet_list(&profile.required_skills)),
            ("preferred", &bullet_list(&profile.preferred_skills)),
            ("score", &report.overall_score.to_string()),
            ("skill_scores", &skill_scores),
            ("gaps", &bullet_list(gaps)),
            ("recommendations", &bullet_list(&report.recommendations)),
        ],
    )
}
