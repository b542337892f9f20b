use anyhow::Result;
use std::sync::Arc;

use crate::models::tutoring::{
    CreateTutoringSessionRequest, TutoringSession, TutoringSessionPatch,
};
use crate::storage::{NewTutoringSession, Storage};

pub struct TutoringService {
    storage: Arc<dyn Storage>,
}

impl TutoringService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(
        &self,
        owner: Option<&str>,
        req: CreateTutoringSessionRequest,
    ) -> Result<TutoringSession> {
        let record = self
            .storage
            .create_tutoring_session(
                owner,
                NewTutoringSession {
                    week_number: req.week_number,
                    date: req.date,
                    student_name: req.student_name,
                    topics_covered: req.topics_covered,
                    notes: req.notes,
                    duration: req.duration,
                    status: req.status.unwrap_or_default(),
                },
            )
            .await?;

        tracing::info!("Created tutoring session {}", record.id);
        Ok(record)
    }

    pub async fn get(&self, id: &str, owner: Option<&str>) -> Result<Option<TutoringSession>> {
        self.storage.get_tutoring_session(id, owner).await
    }

    pub async fn list(&self, owner: Option<&str>) -> Result<Vec<TutoringSession>> {
        self.storage.list_tutoring_sessions(owner).await
    }

    /// Unscoped listing for the admin surface.
    pub async fn list_all(&self) -> Result<Vec<TutoringSession>> {
        self.storage.list_all_tutoring_sessions().await
    }

    pub async fn update(
        &self,
        id: &str,
        owner: Option<&str>,
        patch: &TutoringSessionPatch,
    ) -> Result<Option<TutoringSession>> {
        self.storage.update_tutoring_session(id, owner, patch).await
    }

    pub async fn delete(&self, id: &str, owner: Option<&str>) -> Result<bool> {
        self.storage.delete_tutoring_session(id, owner).await
    }
}
