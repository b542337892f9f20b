use anyhow::Result;
use async_trait::async_trait;

use crate::models::tutoring::{TutoringSession, TutoringSessionPatch};
use crate::models::user::{UpsertUser, User};
use crate::models::{
    Achievement, GameSession, GameSessionPatch, NewAchievement, NewProblem, Problem,
};

mod memory;
mod mongo;

pub use memory::MemStorage;
pub use mongo::MongoStorage;

/// Tutoring record fields as accepted by the store; id, owner and timestamps
/// are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewTutoringSession {
    pub week_number: i32,
    pub date: chrono::NaiveDate,
    pub student_name: String,
    pub topics_covered: Vec<String>,
    pub notes: Option<String>,
    pub duration: i32,
    pub status: crate::models::tutoring::TutoringStatus,
}

/// Persistence boundary for the whole service. Constructed once at startup
/// and injected through `AppState`, never a process-wide singleton, so tests
/// can run against isolated stores.
///
/// Absence is `Ok(None)`; errors are reserved for store failures. `owner` is
/// the authenticated user id, or `None` for the shared anonymous scope.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn ping(&self) -> Result<()>;

    // Game problems
    async fn create_problem(&self, new: NewProblem) -> Result<Problem>;
    async fn get_problem(&self, id: &str) -> Result<Option<Problem>>;

    // Game sessions
    /// Atomic upsert keyed by owner: two concurrent first-time callers must
    /// observe the same session.
    async fn get_or_create_session(&self, owner: Option<&str>) -> Result<GameSession>;
    async fn update_session(
        &self,
        id: &str,
        patch: &GameSessionPatch,
    ) -> Result<Option<GameSession>>;

    // Achievements
    /// Atomic insert-if-absent keyed by (session, title). Returns the stored
    /// achievement when it was actually created, `None` if already unlocked.
    async fn create_achievement_if_absent(
        &self,
        new: NewAchievement,
    ) -> Result<Option<Achievement>>;
    async fn achievements_by_session(&self, session_id: &str) -> Result<Vec<Achievement>>;

    // Tutoring log
    async fn create_tutoring_session(
        &self,
        owner: Option<&str>,
        new: NewTutoringSession,
    ) -> Result<TutoringSession>;
    async fn get_tutoring_session(
        &self,
        id: &str,
        owner: Option<&str>,
    ) -> Result<Option<TutoringSession>>;
    /// Owner-scoped listing, newest date first.
    async fn list_tutoring_sessions(&self, owner: Option<&str>) -> Result<Vec<TutoringSession>>;
    /// Unscoped listing for the admin surface, newest date first.
    async fn list_all_tutoring_sessions(&self) -> Result<Vec<TutoringSession>>;
    async fn update_tutoring_session(
        &self,
        id: &str,
        owner: Option<&str>,
        patch: &TutoringSessionPatch,
    ) -> Result<Option<TutoringSession>>;
    /// Returns whether a record was deleted.
    async fn delete_tutoring_session(&self, id: &str, owner: Option<&str>) -> Result<bool>;

    // Users
    async fn upsert_user(&self, user: UpsertUser) -> Result<User>;
    async fn list_users(&self) -> Result<Vec<User>>;
}
