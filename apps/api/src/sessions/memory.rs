use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AnalysisSession, ResumeVersion, SessionError, SessionStore, UploadedResume};
use crate::analysis::synthesis::SynthesizedResume;

/// Process-local store with time-to-live expiry measured from creation.
/// Expired entries are invisible to reads even before eviction runs.
pub struct InMemorySessionStore {
    ttl: Duration,
    uploads: RwLock<HashMap<Uuid, UploadedResume>>,
    analyses: RwLock<HashMap<Uuid, AnalysisSession>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            uploads: RwLock::new(HashMap::new()),
            analyses: RwLock::new(HashMap::new()),
        }
    }

    fn is_expired(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - created_at >= self.ttl
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put_upload(&self, upload: UploadedResume) -> Result<(), SessionError> {
        let mut uploads = self.uploads.write().await;
        if uploads.contains_key(&upload.id) {
            return Err(SessionError::AlreadyExists(upload.id));
        }
        uploads.insert(upload.id, upload);
        Ok(())
    }

    async fn upload(&self, id: Uuid) -> Option<UploadedResume> {
        let now = Utc::now();
        self.uploads
            .read()
            .await
            .get(&id)
            .filter(|u| !self.is_expired(u.uploaded_at, now))
            .cloned()
    }

    async fn put_analysis(&self, session: AnalysisSession) -> Result<(), SessionError> {
        let mut analyses = self.analyses.write().await;
        if analyses.contains_key(&session.id) {
            return Err(SessionError::AlreadyExists(session.id));
        }
        analyses.insert(session.id, session);
        Ok(())
    }

    async fn analysis(&self, id: Uuid) -> Option<AnalysisSession> {
        let now = Utc::now();
        self.analyses
            .read()
            .await
            .get(&id)
            .filter(|s| !self.is_expired(s.created_at, now))
            .cloned()
    }

    async fn append_resume(
        &self,
        id: Uuid,
        confirmed_skills: BTreeSet<String>,
        resume: SynthesizedResume,
    ) -> Result<u32, SessionError> {
        let now = Utc::now();
        let mut analyses = self.analyses.write().await;
        let session = analyses
            .get_mut(&id)
            .filter(|s| now - s.created_at < self.ttl)
            .ok_or(SessionError::NotFound(id))?;

        let version = session.versions.len() as u32 + 1;
        session.versions.push(ResumeVersion {
            version,
            confirmed_skills,
            resume,
            created_at: now,
        });
        Ok(version)
    }

    async fn evict_expired(&self) -> usize {
        let now = Utc::now();

        let mut uploads = self.uploads.write().await;
        let uploads_before = uploads.len();
        uploads.retain(|_, u| !self.is_expired(u.uploaded_at, now));
        let mut evicted = uploads_before - uploads.len();
        drop(uploads);

        let mut analyses = self.analyses.write().await;
        let analyses_before = analyses.len();
        analyses.retain(|_, s| !self.is_expired(s.created_at, now));
        evicted += analyses_before - analyses.len();

        evicted
    }
}
