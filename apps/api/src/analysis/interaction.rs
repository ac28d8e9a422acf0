//! Human interaction — the capability the pipeline uses to ask the candidate
//! which missing skills they actually have.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use crate::analysis::gap_decision::ClarificationRequest;

/// Asks the candidate about the skills in a `ClarificationRequest`.
///
/// Returns the skills the candidate affirms, possibly none. The pipeline awaits
/// the answer with no timeout of its own; callers bound it if they need to.
#[async_trait]
pub trait HumanInteraction: Send + Sync {
    async fn ask(&self, request: &ClarificationRequest) -> anyhow::Result<BTreeSet<String>>;
}

/// Answers from a set the caller collected up front (e.g. sent with an HTTP request).
///
/// Only requested skills are affirmed, matched case-insensitively and returned
/// with the request's spelling.
#[derive(Debug, Clone, Default)]
pub struct PresetAnswers {
    affirmed: BTreeSet<String>,
}

impl PresetAnswers {
    pub fn new<I, S>(affirmed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            affirmed: affirmed.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl HumanInteraction for PresetAnswers {
    async fn ask(&self, request: &ClarificationRequest) -> anyhow::Result<BTreeSet<String>> {
        let requested: HashMap<String, &String> = request
            .missing_skills
            .iter()
            .map(|skill| (skill.trim().to_lowercase(), skill))
            .collect();

        Ok(self
            .affirmed
            .iter()
            .filter_map(|skill| requested.get(&skill.trim().to_lowercase()))
            .map(|skill| (*skill).clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(skills: &[&str]) -> ClarificationRequest {
        ClarificationRequest {
            rationale: "Infrastructure gaps".to_string(),
            missing_skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_preset_answers_affirm_only_requested_skills() {
        let answers = PresetAnswers::new(["kubernetes", "Rust"]);
        let confirmed = answers
            .ask(&request(&["Kubernetes", "Terraform"]))
            .await
            .unwrap();

        assert_eq!(confirmed.len(), 1);
        assert!(confirmed.contains("Kubernetes"));
    }

    #[tokio::test]
    async fn test_empty_preset_affirms_nothing() {
        let confirmed = PresetAnswers::default()
            .ask(&request(&["Kubernetes"]))
            .await
            .unwrap();
        assert!(confirmed.is_empty());
    }
}
