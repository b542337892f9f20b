use anyhow::{anyhow, Result};
use std::sync::Arc;

use crate::models::user::UpsertUser;
use crate::models::{GameSession, GameSessionPatch, SessionOverview};
use crate::storage::Storage;

pub struct SessionService {
    storage: Arc<dyn Storage>,
}

impl SessionService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Get-or-create semantics: the caller always gets a session, created
    /// with default settings on first contact. An authenticated profile is
    /// mirrored into the users store on the way through.
    pub async fn current_session(
        &self,
        owner: Option<&str>,
        profile: Option<UpsertUser>,
    ) -> Result<SessionOverview> {
        if let Some(profile) = profile {
            self.storage.upsert_user(profile).await?;
        }

        let session = self.storage.get_or_create_session(owner).await?;
        let achievements = self.storage.achievements_by_session(&session.id).await?;

        Ok(SessionOverview {
            session,
            achievements,
        })
    }

    pub async fn update_settings(
        &self,
        owner: Option<&str>,
        patch: &GameSessionPatch,
    ) -> Result<GameSession> {
        let session = self.storage.get_or_create_session(owner).await?;
        self.storage
            .update_session(&session.id, patch)
            .await?
            .ok_or_else(|| anyhow!("Session {} vanished during settings update", session.id))
    }

    /// Zeroes the progress counters, preserving settings.
    pub async fn reset_progress(&self, owner: Option<&str>) -> Result<GameSession> {
        let session = self.storage.get_or_create_session(owner).await?;
        let reset = self
            .storage
            .update_session(&session.id, &GameSessionPatch::reset_progress())
            .await?
            .ok_or_else(|| anyhow!("Session {} vanished during reset", session.id))?;

        tracing::info!("Progress reset for session {}", reset.id);
        Ok(reset)
    }
}
