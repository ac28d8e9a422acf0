//! Candidate matching — scores résumé text against a `JobProfile`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::job_profile::JobProfile;
use crate::analysis::prompts::{MATCH_REPORT_ROLE, MATCH_REPORT_SCHEMA, MATCH_REPORT_TEMPLATE};
use crate::analysis::{bullet_list, fill_template, AnalysisFailed, Stage};
use crate::extraction::{Extractor, Validate};
use crate::llm_client::prompts::json_system;

/// Scoring is near-deterministic.
pub const MATCH_REPORT_TEMPERATURE: f32 = 0.0;

/// Relevance of one past position to the target role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceRelevance {
    pub role: String,
    pub organization: String,
    pub period: String,
    /// 0 – 10 by convention
    pub score: u8,
    pub notes: String,
}

/// Structured scoring of a résumé against a job profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub candidate_name: String,
    pub overall_score: u8, // 0 – 100
    pub skill_scores: BTreeMap<String, u8>, // skill → 0 – 10
    pub experience_relevance: Vec<ExperienceRelevance>,
    pub skill_gaps: Vec<String>,
    pub recommendations: Vec<String>,
    pub summary: String,
}

impl Validate for MatchReport {
    fn validate(&self) -> Result<(), String> {
        if self.overall_score > 100 {
            return Err(format!(
                "overall_score must be within 0-100, got {}",
                self.overall_score
            ));
        }
        if self.skill_scores.keys().any(|k| k.trim().is_empty()) {
            return Err("skill_scores contains an empty skill name".to_string());
        }
        Ok(())
    }
}

impl MatchReport {
    /// Best per-skill score scaled to 0 – 100; `None` when nothing was scored.
    pub fn best_skill_percent(&self) -> Option<u8> {
        self.skill_scores
            .values()
            .max()
            .map(|best| (u16::from(*best) * 10).min(100) as u8)
    }
}

/// Scores `resume_text` against `profile`.
pub async fn score_candidate(
    resume_text: &str,
    profile: &JobProfile,
    extractor: &Extractor,
) -> Result<MatchReport, AnalysisFailed> {
    let system = json_system(&format!("{MATCH_REPORT_ROLE}\n\n{MATCH_REPORT_SCHEMA}"));
    let prompt = build_match_prompt(resume_text, profile);

    let report: MatchReport = extractor
        .extract(&system, &prompt, MATCH_REPORT_TEMPERATURE)
        .await
        .map_err(AnalysisFailed::at(Stage::Profile))?;

    info!(
        "Match report for {:?}: {}/100, {} gaps",
        report.candidate_name,
        report.overall_score,
        report.skill_gaps.len()
    );
    Ok(report)
}

fn build_match_prompt(resume_text: &str, profile: &JobProfile) -> String {
    fill_template(
        MATCH_REPORT_TEMPLATE,
        &[
            ("title", &profile.title),
            ("required", &bullet_list(&profile.required_skills)),
            ("preferred", &bullet_list(&profile.preferred_skills)),
            ("responsibilities", &bullet_list(&profile.responsibilities)),
            ("domains", &bullet_list(&profile.technical_domains)),
            ("resume", resume_text.trim()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analysis::fixtures::{platform_profile, report};
    use crate::extraction::{parse_record, ExtractionError};
    use crate::llm_client::testing::ScriptedBackend;

    const REPORT_JSON: &str = r#"{
        "candidate_name": "Martin Dupont",
        "overall_score": 55,
        "skill_scores": {"Python": 8, "Kubernetes": 1, "Terraform": 0},
        "experience_relevance": [
            {"role": "Backend Developer", "organization": "TechWave", "period": "2021 - Present", "score": 6, "notes": "Python services"}
        ],
        "skill_gaps": ["Kubernetes", "Terraform"],
        "recommendations": ["Mention CI/CD automation"],
        "summary": "Strong Python, missing infrastructure."
    }"#;

    #[test]
    fn test_report_deserializes() {
        let report: MatchReport = parse_record(REPORT_JSON).unwrap();
        assert_eq!(report.overall_score, 55);
        assert_eq!(report.skill_scores["Python"], 8);
        assert_eq!(report.experience_relevance[0].organization, "TechWave");
        assert_eq!(report.skill_gaps, vec!["Kubernetes", "Terraform"]);
    }

    #[test]
    fn test_overall_score_above_100_is_rejected() {
        let json = REPORT_JSON.replace("\"overall_score\": 55", "\"overall_score\": 140");
        let err = parse_record::<MatchReport>(&json).unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation { .. }));
    }

    #[test]
    fn test_negative_overall_score_is_rejected() {
        let json = REPORT_JSON.replace("\"overall_score\": 55", "\"overall_score\": -5");
        let err = parse_record::<MatchReport>(&json).unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation { .. }));
    }

    #[test]
    fn test_blank_skill_key_is_rejected() {
        let json = REPORT_JSON.replace("\"Terraform\": 0", "\" \": 0");
        let err = parse_record::<MatchReport>(&json).unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation { .. }));
    }

    #[test]
    fn test_best_skill_percent() {
        let scored = report(50, &[("Python", 8), ("Go", 3)], &[]);
        assert_eq!(scored.best_skill_percent(), Some(80));
        assert_eq!(report(50, &[], &[]).best_skill_percent(), None);
    }

    #[test]
    fn test_match_prompt_carries_profile_context() {
        let prompt = build_match_prompt("Martin Dupont\nPython developer", &platform_profile());
        assert!(prompt.contains("Title: Platform Engineer"));
        assert!(prompt.contains("- Kubernetes"));
        assert!(prompt.contains("- Operate the Kubernetes fleet"));
        assert!(prompt.contains("- DevOps"));
        assert!(prompt.ends_with("Python developer"));
    }

    #[test]
    fn test_title_with_marker_text_is_not_expanded() {
        let mut profile = platform_profile();
        profile.title = "Platform Engineer {resume}".to_string();

        let prompt = build_match_prompt("Python developer", &profile);
        assert!(prompt.contains("Title: Platform Engineer {resume}"));
        assert_eq!(prompt.matches("Python developer").count(), 1);
    }

    #[tokio::test]
    async fn test_score_candidate_failure_is_tagged_with_profile_stage() {
        let backend = Arc::new(ScriptedBackend::new().reply(r#"{"candidate_name": "X"}"#));
        let extractor = Extractor::new(backend);

        let err = score_candidate("résumé", &platform_profile(), &extractor)
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::Profile);
        assert!(err.to_string().contains("'profile'"));
    }
}
