// Résumé optimization pipeline.
// Implements: job extraction, candidate matching, gap decision, synthesis, orchestration.
// All model calls go through extraction::Extractor — no direct backend calls here.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::extraction::ExtractionError;

pub mod gap_decision;
pub mod handlers;
pub mod interaction;
pub mod job_profile;
pub mod match_report;
pub mod pipeline;
pub mod prompts;
pub mod synthesis;

/// Position of a stage in the pipeline. Reported with every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Job,
    Profile,
    Synthesis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Job => "job",
            Stage::Profile => "profile",
            Stage::Synthesis => "synthesis",
        };
        f.write_str(name)
    }
}

/// A stage failed to produce its record.
#[derive(Debug, Error)]
#[error("analysis failed at stage '{stage}': {source}")]
pub struct AnalysisFailed {
    pub stage: Stage,
    #[source]
    pub source: ExtractionError,
}

impl AnalysisFailed {
    pub fn at(stage: Stage) -> impl FnOnce(ExtractionError) -> Self {
        move |source| Self { stage, source }
    }
}

/// Bulleted rendering of a list for prompt contexts.
fn bullet_list<'a, I>(items: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let lines: Vec<String> = items.into_iter().map(|s| format!("- {s}")).collect();
    if lines.is_empty() {
        "- (none)".to_string()
    } else {
        lines.join("\n")
    }
}

/// Fills `{name}` markers in one pass. Substituted text is never rescanned,
/// so values may contain braces or other marker names. Unknown markers stay as-is.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
