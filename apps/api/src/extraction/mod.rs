//! Structured extraction — turns free text plus a target record type into a
//! validated value by way of a `TextBackend`.
//!
//! Every stage that needs model output goes through `Extractor::extract`.
//! Output is fence-stripped, parsed as strict JSON, built into the typed
//! record by serde (missing required fields and wrong types fail here), and
//! finally checked by the record's `Validate` impl.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::{LlmError, TextBackend};

mod fences;

pub use fences::strip_code_fence;

/// Max characters of raw model output echoed into logs.
const RAW_LOG_EXCERPT: usize = 300;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("user content is empty")]
    EmptyInput,

    #[error("backend call failed: {0}")]
    Backend(#[from] LlmError),

    #[error("model output is not valid JSON: {source}")]
    MalformedOutput {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model output does not match the expected record: {detail}")]
    SchemaViolation { raw: String, detail: String },
}

impl ExtractionError {
    /// Raw backend text attached to the failure, when the backend produced any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ExtractionError::MalformedOutput { raw, .. }
            | ExtractionError::SchemaViolation { raw, .. } => Some(raw),
            ExtractionError::EmptyInput | ExtractionError::Backend(_) => None,
        }
    }

    /// Transient failures are worth retrying by the caller; output failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExtractionError::Backend(_))
    }
}

/// Post-deserialization invariants for an extracted record.
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// The shared extraction capability. Cheap to clone.
#[derive(Clone)]
pub struct Extractor {
    backend: Arc<dyn TextBackend>,
}

impl Extractor {
    pub fn new(backend: Arc<dyn TextBackend>) -> Self {
        Self { backend }
    }

    /// Runs one backend call and builds a `T` from its output.
    pub async fn extract<T>(
        &self,
        system: &str,
        user_content: &str,
        temperature: f32,
    ) -> Result<T, ExtractionError>
    where
        T: DeserializeOwned + Validate,
    {
        if user_content.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        debug!(
            "Extracting {} (system={} chars, user={} chars, temperature={temperature})",
            short_type_name::<T>(),
            system.len(),
            user_content.len()
        );

        let raw = self
            .backend
            .complete(system, user_content, temperature)
            .await
            .inspect_err(|e| warn!("Backend call failed: {e}"))?;

        parse_record(&raw).inspect_err(|e| {
            warn!(
                "Extraction of {} failed: {e}; raw output: {:?}",
                short_type_name::<T>(),
                excerpt(&raw)
            )
        })
    }
}

/// Parses raw backend text into a validated record. No backend involved.
pub fn parse_record<T>(raw: &str) -> Result<T, ExtractionError>
where
    T: DeserializeOwned + Validate,
{
    let body = strip_code_fence(raw);

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|source| ExtractionError::MalformedOutput {
            raw: raw.to_string(),
            source,
        })?;

    let record: T =
        serde_json::from_value(value).map_err(|e| ExtractionError::SchemaViolation {
            raw: raw.to_string(),
            detail: e.to_string(),
        })?;

    record
        .validate()
        .map_err(|detail| ExtractionError::SchemaViolation {
            raw: raw.to_string(),
            detail,
        })?;

    Ok(record)
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(RAW_LOG_EXCERPT).collect()
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
