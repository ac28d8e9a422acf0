//! Résumé synthesis — merges the job profile, the match report and any
//! human-confirmed skills into the final structured résumé.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::job_profile::JobProfile;
use crate::analysis::match_report::MatchReport;
use crate::analysis::prompts::{SYNTHESIS_ROLE, SYNTHESIS_SCHEMA, SYNTHESIS_TEMPLATE};
use crate::analysis::{bullet_list, fill_template, AnalysisFailed, Stage};
use crate::extraction::{Extractor, Validate};
use crate::llm_client::prompts::{json_system, GROUNDING_INSTRUCTION};

/// Mildly creative: summaries get rewritten.
pub const SYNTHESIS_TEMPERATURE: f32 = 0.1;

/// Field name → value, as consumed by document templates.
pub type Fields = BTreeMap<String, String>;

/// The job-tailored résumé handed to document rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedResume {
    pub personal: Fields,
    pub education: Vec<Fields>,
    pub experience: Vec<Fields>,
    /// Relevance-ordered.
    pub skills: Vec<String>,
    pub links: Fields,
}

impl Validate for SynthesizedResume {}

impl SynthesizedResume {
    /// Appends every confirmed skill the model left out, keeping model order first.
    fn merge_confirmed(&mut self, confirmed: &BTreeSet<String>) {
        let present: HashSet<String> = self.skills.iter().map(|s| s.to_lowercase()).collect();
        for skill in confirmed {
            if !present.contains(&skill.to_lowercase()) {
                debug!("Appending confirmed skill omitted by the model: {skill}");
                self.skills.push(skill.clone());
            }
        }
    }
}

/// Generates the optimized résumé. `confirmed` is `None` when no clarification
/// round happened.
pub async fn synthesize_resume(
    profile: &JobProfile,
    report: &MatchReport,
    confirmed: Option<&BTreeSet<String>>,
    extractor: &Extractor,
) -> Result<SynthesizedResume, AnalysisFailed> {
    let empty = BTreeSet::new();
    let confirmed = confirmed.unwrap_or(&empty);

    let system = json_system(&format!(
        "{SYNTHESIS_ROLE}\n\n{GROUNDING_INSTRUCTION}\n\n{SYNTHESIS_SCHEMA}"
    ));
    let prompt = build_synthesis_prompt(profile, report, confirmed);

    let mut resume: SynthesizedResume = extractor
        .extract(&system, &prompt, SYNTHESIS_TEMPERATURE)
        .await
        .map_err(AnalysisFailed::at(Stage::Synthesis))?;

    resume.merge_confirmed(confirmed);

    info!(
        "Synthesized résumé: {} experience entries, {} skills",
        resume.experience.len(),
        resume.skills.len()
    );
    Ok(resume)
}

fn build_synthesis_prompt(
    profile: &JobProfile,
    report: &MatchReport,
    confirmed: &BTreeSet<String>,
) -> String {
    let skill_scores = serde_json::to_string(&report.skill_scores).unwrap_or_default();
    let experience_json =
        serde_json::to_string_pretty(&report.experience_relevance).unwrap_or_default();

    fill_template(
        SYNTHESIS_TEMPLATE,
        &[
            ("title", &profile.title),
            ("required", &bullet_list(&profile.required_skills)),
            ("preferred", &bullet_list(&profile.preferred_skills)),
            ("responsibilities", &bullet_list(&profile.responsibilities)),
            ("ats_keywords", &bullet_list(&profile.ats_keywords)),
            ("candidate", &report.candidate_name),
            ("score", &report.overall_score.to_string()),
            ("skill_scores", &skill_scores),
            ("experience_json", &experience_json),
            ("confirmed", &bullet_list(confirmed)),
        ],
    )
}
