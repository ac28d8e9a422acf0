//! Pipeline orchestration — sequences the stages of one optimization run.
//!
//! Flow: analyze_job → score_candidate → decide → (ask the human) → synthesize_resume.
//!
//! Stages run strictly in order. When a stage fails, everything computed so far
//! is returned with the failure so the caller can retry only what failed.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::gap_decision::{ClarificationRequest, GapDecision, GapDecisionEngine};
use crate::analysis::interaction::HumanInteraction;
use crate::analysis::job_profile::{analyze_job, JobProfile};
use crate::analysis::match_report::{score_candidate, MatchReport};
use crate::analysis::synthesis::{synthesize_resume, SynthesizedResume};
use crate::analysis::AnalysisFailed;
use crate::extraction::Extractor;

/// Output of the analysis half of a run (everything before the human step).
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub profile: JobProfile,
    pub report: MatchReport,
    pub decision: GapDecision,
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub profile: JobProfile,
    pub report: MatchReport,
    pub request: Option<ClarificationRequest>,
    pub confirmed_skills: Option<BTreeSet<String>>,
    pub resume: SynthesizedResume,
}

/// Records computed before a stage failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PartialRun {
    pub profile: Option<JobProfile>,
    pub report: Option<MatchReport>,
    pub request: Option<ClarificationRequest>,
    pub confirmed_skills: Option<BTreeSet<String>>,
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct PipelineFailure {
    #[source]
    pub error: AnalysisFailed,
    pub partial: PartialRun,
}

#[derive(Clone)]
pub struct Pipeline {
    extractor: Extractor,
    gap_engine: GapDecisionEngine,
}

impl Pipeline {
    pub fn new(extractor: Extractor, gap_engine: GapDecisionEngine) -> Self {
        Self {
            extractor,
            gap_engine,
        }
    }

    /// Job profile → match report → gap decision.
    pub async fn analyze(
        &self,
        job_text: &str,
        resume_text: &str,
    ) -> Result<Analysis, PipelineFailure> {
        info!("Analyzing job posting");
        let profile = analyze_job(job_text, &self.extractor)
            .await
            .map_err(|error| PipelineFailure {
                error,
                partial: PartialRun::default(),
            })?;

        info!("Scoring résumé against {:?}", profile.title);
        let report = match score_candidate(resume_text, &profile, &self.extractor).await {
            Ok(report) => report,
            Err(error) => {
                return Err(PipelineFailure {
                    error,
                    partial: PartialRun {
                        profile: Some(profile),
                        ..PartialRun::default()
                    },
                })
            }
        };

        info!("Checking whether clarification is needed");
        let decision = self
            .gap_engine
            .decide(&report, &profile, &self.extractor)
            .await;

        Ok(Analysis {
            profile,
            report,
            decision,
        })
    }

    /// Final stage on its own, for callers that collected confirmations separately.
    pub async fn synthesize(
        &self,
        profile: &JobProfile,
        report: &MatchReport,
        confirmed: Option<&BTreeSet<String>>,
    ) -> Result<SynthesizedResume, AnalysisFailed> {
        synthesize_resume(profile, report, confirmed, &self.extractor).await
    }

    /// Runs the whole pipeline, asking `interaction` when clarification is warranted.
    pub async fn run(
        &self,
        job_text: &str,
        resume_text: &str,
        interaction: Option<&dyn HumanInteraction>,
    ) -> Result<RunResult, PipelineFailure> {
        let run_id = Uuid::new_v4();
        self.run_stages(run_id, job_text, resume_text, interaction)
            .instrument(info_span!("pipeline_run", %run_id))
            .await
    }

    async fn run_stages(
        &self,
        run_id: Uuid,
        job_text: &str,
        resume_text: &str,
        interaction: Option<&dyn HumanInteraction>,
    ) -> Result<RunResult, PipelineFailure> {
        let Analysis {
            profile,
            report,
            decision,
        } = self.analyze(job_text, resume_text).await?;

        let confirmed_skills = match (&decision.request, interaction) {
            (Some(request), Some(human)) => match human.ask(request).await {
                Ok(skills) => {
                    info!(
                        "Candidate confirmed {} of {} skills",
                        skills.len(),
                        request.missing_skills.len()
                    );
                    Some(skills)
                }
                Err(e) => {
                    warn!("Human interaction failed, continuing without confirmed skills: {e:#}");
                    None
                }
            },
            (Some(_), None) => {
                warn!("Clarification warranted but no human interaction available: producing reduced-quality résumé");
                None
            }
            (None, _) => None,
        };

        info!("Synthesizing optimized résumé");
        let resume = match self
            .synthesize(&profile, &report, confirmed_skills.as_ref())
            .await
        {
            Ok(resume) => resume,
            Err(error) => {
                return Err(PipelineFailure {
                    error,
                    partial: PartialRun {
                        profile: Some(profile),
                        report: Some(report),
                        request: decision.request,
                        confirmed_skills,
                    },
                })
            }
        };

        info!("Run complete");
        Ok(RunResult {
            run_id,
            profile,
            report,
            request: decision.request,
            confirmed_skills,
            resume,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::analysis::fixtures::set;
    use crate::analysis::gap_decision::GapPolicy;
    use crate::analysis::interaction::PresetAnswers;
    use crate::analysis::Stage;
    use crate::llm_client::testing::ScriptedBackend;

    const PROFILE_JSON: &str = r#"{
        "title": "Platform Engineer",
        "required_skills": ["Python", "Kubernetes", "Terraform"],
        "preferred_skills": [],
        "responsibilities": ["Run the platform"],
        "ats_keywords": ["Kubernetes"]
    }"#;

    const WEAK_REPORT_JSON: &str = r#"{
        "candidate_name": "Martin Dupont",
        "overall_score": 45,
        "skill_scores": {"Python": 8, "Kubernetes": 0, "Terraform": 0},
        "experience_relevance": [],
        "skill_gaps": ["Kubernetes", "Terraform"],
        "recommendations": [],
        "summary": "Python only."
    }"#;

    const STRONG_REPORT_JSON: &str = r#"{
        "candidate_name": "Martin Dupont",
        "overall_score": 90,
        "skill_scores": {"Python": 9, "Kubernetes": 8, "Terraform": 8},
        "experience_relevance": [],
        "skill_gaps": [],
        "recommendations": [],
        "summary": "Great fit."
    }"#;

    const CLARIFICATION_JSON: &str =
        r#"{"rationale": "No infrastructure tooling.", "missing_skills": ["Kubernetes", "Terraform"]}"#;

    const RESUME_JSON: &str = r#"{
        "personal": {"name": "Martin Dupont", "title": "Platform Engineer"},
        "education": [],
        "experience": [],
        "skills": ["Python"],
        "links": {}
    }"#;

    struct Unreachable;

    #[async_trait]
    impl HumanInteraction for Unreachable {
        async fn ask(&self, _request: &ClarificationRequest) -> anyhow::Result<BTreeSet<String>> {
            anyhow::bail!("candidate closed the window")
        }
    }

    fn pipeline(backend: Arc<ScriptedBackend>) -> Pipeline {
        Pipeline::new(
            Extractor::new(backend),
            GapDecisionEngine::new(GapPolicy::default()),
        )
    }

    #[tokio::test]
    async fn test_weak_match_with_confirmation_reaches_resume() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply(PROFILE_JSON)
                .reply(WEAK_REPORT_JSON)
                .reply(CLARIFICATION_JSON)
                .reply(RESUME_JSON),
        );
        let answers = PresetAnswers::new(["Kubernetes"]);

        let result = pipeline(backend.clone())
            .run("posting", "Python developer", Some(&answers))
            .await
            .unwrap();

        assert!(result.report.overall_score < 60);
        let request = result.request.unwrap();
        let allowed = set(&["Kubernetes", "Terraform"]);
        assert!(request.missing_skills.iter().all(|s| allowed.contains(s)));
        assert_eq!(result.confirmed_skills, Some(set(&["Kubernetes"])));
        assert!(result.resume.skills.contains(&"Kubernetes".to_string()));
        assert_eq!(backend.call_count(), 4);
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply(PROFILE_JSON)
                .reply(WEAK_REPORT_JSON)
                .reply(CLARIFICATION_JSON)
                .reply(RESUME_JSON),
        );
        pipeline(backend.clone())
            .run("posting", "Python developer", None)
            .await
            .unwrap();

        let calls = backend.calls();
        assert!(calls[0].system.contains("job posting"));
        assert!(calls[1].user.contains("Python developer"));
        assert!(calls[2].system.contains("skills gap"));
        assert!(calls[3].system.contains("résumé section generator"));
    }

    #[tokio::test]
    async fn test_strong_match_skips_clarification() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply(PROFILE_JSON)
                .reply(STRONG_REPORT_JSON)
                .reply(RESUME_JSON),
        );
        let answers = PresetAnswers::new(["Kubernetes"]);

        let result = pipeline(backend.clone())
            .run("posting", "résumé", Some(&answers))
            .await
            .unwrap();

        assert!(result.request.is_none());
        assert!(result.confirmed_skills.is_none());
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_missing_interaction_still_synthesizes() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply(PROFILE_JSON)
                .reply(WEAK_REPORT_JSON)
                .reply(CLARIFICATION_JSON)
                .reply(RESUME_JSON),
        );

        let result = pipeline(backend).run("posting", "résumé", None).await.unwrap();

        assert!(result.request.is_some());
        assert!(result.confirmed_skills.is_none());
        assert_eq!(result.resume.skills, vec!["Python"]);
    }

    #[tokio::test]
    async fn test_failed_interaction_still_synthesizes() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply(PROFILE_JSON)
                .reply(WEAK_REPORT_JSON)
                .reply(CLARIFICATION_JSON)
                .reply(RESUME_JSON),
        );

        let result = pipeline(backend)
            .run("posting", "résumé", Some(&Unreachable))
            .await
            .unwrap();
        assert!(result.confirmed_skills.is_none());
    }

    #[tokio::test]
    async fn test_matching_failure_keeps_profile() {
        let backend = Arc::new(ScriptedBackend::new().reply(PROFILE_JSON).reply("oops"));

        let failure = pipeline(backend.clone())
            .run("posting", "résumé", None)
            .await
            .unwrap_err();

        assert_eq!(failure.error.stage, Stage::Profile);
        assert_eq!(failure.partial.profile.unwrap().title, "Platform Engineer");
        assert!(failure.partial.report.is_none());
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_job_failure_has_empty_partial() {
        let backend = Arc::new(ScriptedBackend::new().reply("[]"));

        let failure = pipeline(backend).run("posting", "résumé", None).await.unwrap_err();

        assert_eq!(failure.error.stage, Stage::Job);
        assert!(failure.partial.profile.is_none());
    }

    #[tokio::test]
    async fn test_synthesis_failure_keeps_everything_before_it() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply(PROFILE_JSON)
                .reply(WEAK_REPORT_JSON)
                .reply(CLARIFICATION_JSON)
                .reply("not a résumé"),
        );
        let answers = PresetAnswers::new(["Terraform"]);

        let failure = pipeline(backend)
            .run("posting", "résumé", Some(&answers))
            .await
            .unwrap_err();

        assert_eq!(failure.error.stage, Stage::Synthesis);
        assert!(failure.partial.profile.is_some());
        assert_eq!(failure.partial.report.unwrap().overall_score, 45);
        assert!(failure.partial.request.is_some());
        assert_eq!(failure.partial.confirmed_skills, Some(set(&["Terraform"])));
    }
}
