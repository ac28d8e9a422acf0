//! Session storage — uploaded résumés and analysis runs, keyed by `Uuid`.
//!
//! The pipeline never touches this; HTTP handlers persist what it returns.
//! Entries are append-only per key: regenerating a résumé adds a version.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::analysis::pipeline::Analysis;
use crate::analysis::synthesis::SynthesizedResume;

mod memory;

pub use memory::InMemorySessionStore;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(Uuid),

    #[error("session {0} already exists")]
    AlreadyExists(Uuid),
}

/// Text extracted from an uploaded résumé.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedResume {
    pub id: Uuid,
    pub filename: String,
    pub text: String,
    pub uploaded_at: DateTime<Utc>,
}

/// One synthesized résumé attached to an analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeVersion {
    pub version: u32,
    pub confirmed_skills: BTreeSet<String>,
    pub resume: SynthesizedResume,
    pub created_at: DateTime<Utc>,
}

/// An analysis run and every résumé generated from it.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSession {
    pub id: Uuid,
    pub resume_id: Option<Uuid>,
    pub job_description: String,
    pub analysis: Analysis,
    pub versions: Vec<ResumeVersion>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisSession {
    pub fn new(
        id: Uuid,
        resume_id: Option<Uuid>,
        job_description: String,
        analysis: Analysis,
    ) -> Self {
        Self {
            id,
            resume_id,
            job_description,
            analysis,
            versions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn latest_resume(&self) -> Option<&ResumeVersion> {
        self.versions.last()
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put_upload(&self, upload: UploadedResume) -> Result<(), SessionError>;

    async fn upload(&self, id: Uuid) -> Option<UploadedResume>;

    async fn put_analysis(&self, session: AnalysisSession) -> Result<(), SessionError>;

    async fn analysis(&self, id: Uuid) -> Option<AnalysisSession>;

    /// Adds a résumé version to an analysis and returns its version number (1-based).
    async fn append_resume(
        &self,
        id: Uuid,
        confirmed_skills: BTreeSet<String>,
        resume: SynthesizedResume,
    ) -> Result<u32, SessionError>;

    /// Drops expired entries; returns how many were removed.
    async fn evict_expired(&self) -> usize;
}

/// Periodically evicts expired sessions until the runtime shuts down.
pub fn spawn_eviction(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let evicted = store.evict_expired().await;
            if evicted > 0 {
                info!("Evicted {evicted} expired sessions");
            }
        }
    })
}
