use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewTutoringSession, Storage};
use crate::models::tutoring::{TutoringSession, TutoringSessionPatch};
use crate::models::user::{UpsertUser, User};
use crate::models::{
    Achievement, GameSession, GameSessionPatch, NewAchievement, NewProblem, Problem,
};

#[derive(Default)]
struct Inner {
    problems: HashMap<String, Problem>,
    sessions: HashMap<String, GameSession>,
    /// Owner (None = anonymous) -> session id.
    session_by_owner: HashMap<Option<String>, String>,
    achievements: HashMap<String, Achievement>,
    tutoring: HashMap<String, TutoringSession>,
    users: HashMap<String, User>,
}

/// In-process store used when no database is configured and by the test
/// suite. A single lock guards all maps, which makes the get-or-create and
/// insert-if-absent operations naturally atomic.
///
/// Generated problems are never evicted; under sustained use this map grows
/// without bound.
#[derive(Default)]
pub struct MemStorage {
    inner: RwLock<Inner>,
}

impl MemStorage {
    pub fn new() -> Self {
        MemStorage::default()
    }
}

fn sort_by_date_desc(records: &mut [TutoringSession]) {
    records.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

#[async_trait]
impl Storage for MemStorage {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn create_problem(&self, new: NewProblem) -> Result<Problem> {
        let problem = Problem {
            id: Uuid::new_v4().to_string(),
            num1: new.num1,
            num2: new.num2,
            correct_answer: new.correct_answer,
            difficulty: new.difficulty,
            options: new.options,
            created_at: Utc::now(),
        };
        let mut inner = self.inner.write().await;
        inner.problems.insert(problem.id.clone(), problem.clone());
        Ok(problem)
    }

    async fn get_problem(&self, id: &str) -> Result<Option<Problem>> {
        let inner = self.inner.read().await;
        Ok(inner.problems.get(id).cloned())
    }

    async fn get_or_create_session(&self, owner: Option<&str>) -> Result<GameSession> {
        let key = owner.map(str::to_string);
        let mut inner = self.inner.write().await;

        if let Some(session_id) = inner.session_by_owner.get(&key) {
            if let Some(session) = inner.sessions.get(session_id) {
                return Ok(session.clone());
            }
        }

        let session = GameSession::new_default(Uuid::new_v4().to_string(), key.clone());
        inner.session_by_owner.insert(key, session.id.clone());
        inner.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn update_session(
        &self,
        id: &str,
        patch: &GameSessionPatch,
    ) -> Result<Option<GameSession>> {
        let mut inner = self.inner.write().await;
        match inner.sessions.get_mut(id) {
            Some(session) => {
                patch.apply(session);
                Ok(Some(session.clone()))
            }
            None => Ok(None),
        }
    }

    async fn create_achievement_if_absent(
        &self,
        new: NewAchievement,
    ) -> Result<Option<Achievement>> {
        let mut inner = self.inner.write().await;

        let already_unlocked = inner
            .achievements
            .values()
            .any(|a| a.session_id == new.session_id && a.title == new.title);
        if already_unlocked {
            return Ok(None);
        }

        let achievement = Achievement {
            id: Uuid::new_v4().to_string(),
            session_id: new.session_id,
            title: new.title,
            description: new.description,
            icon: new.icon,
            color: new.color,
            unlocked_at: Utc::now(),
        };
        inner
            .achievements
            .insert(achievement.id.clone(), achievement.clone());
        Ok(Some(achievement))
    }

    async fn achievements_by_session(&self, session_id: &str) -> Result<Vec<Achievement>> {
        let inner = self.inner.read().await;
        let mut unlocked: Vec<Achievement> = inner
            .achievements
            .values()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect();
        unlocked.sort_by(|a, b| a.unlocked_at.cmp(&b.unlocked_at));
        Ok(unlocked)
    }

    async fn create_tutoring_session(
        &self,
        owner: Option<&str>,
        new: NewTutoringSession,
    ) -> Result<TutoringSession> {
        let now = Utc::now();
        let record = TutoringSession {
            id: Uuid::new_v4().to_string(),
            user_id: owner.map(str::to_string),
            week_number: new.week_number,
            date: new.date,
            student_name: new.student_name,
            topics_covered: new.topics_covered,
            notes: new.notes,
            duration: new.duration,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.inner.write().await;
        inner.tutoring.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_tutoring_session(
        &self,
        id: &str,
        owner: Option<&str>,
    ) -> Result<Option<TutoringSession>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tutoring
            .get(id)
            .filter(|r| r.user_id.as_deref() == owner)
            .cloned())
    }

    async fn list_tutoring_sessions(&self, owner: Option<&str>) -> Result<Vec<TutoringSession>> {
        let inner = self.inner.read().await;
        let mut records: Vec<TutoringSession> = inner
            .tutoring
            .values()
            .filter(|r| r.user_id.as_deref() == owner)
            .cloned()
            .collect();
        sort_by_date_desc(&mut records);
        Ok(records)
    }

    async fn list_all_tutoring_sessions(&self) -> Result<Vec<TutoringSession>> {
        let inner = self.inner.read().await;
        let mut records: Vec<TutoringSession> = inner.tutoring.values().cloned().collect();
        sort_by_date_desc(&mut records);
        Ok(records)
    }

    async fn update_tutoring_session(
        &self,
        id: &str,
        owner: Option<&str>,
        patch: &TutoringSessionPatch,
    ) -> Result<Option<TutoringSession>> {
        let mut inner = self.inner.write().await;
        match inner
            .tutoring
            .get_mut(id)
            .filter(|r| r.user_id.as_deref() == owner)
        {
            Some(record) => {
                patch.apply(record);
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_tutoring_session(&self, id: &str, owner: Option<&str>) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .tutoring
            .get(id)
            .is_some_and(|r| r.user_id.as_deref() == owner);
        if !owned {
            return Ok(false);
        }
        inner.tutoring.remove(id);
        Ok(true)
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<User> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let entry = inner
            .users
            .entry(user.id.clone())
            .and_modify(|existing| {
                existing.email = user.email.clone();
                existing.first_name = user.first_name.clone();
                existing.last_name = user.last_name.clone();
                existing.profile_image_url = user.profile_image_url.clone();
                existing.is_admin = user.is_admin;
                existing.updated_at = now;
            })
            .or_insert_with(|| User {
                id: user.id.clone(),
                email: user.email.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                profile_image_url: user.profile_image_url.clone(),
                is_admin: user.is_admin,
                created_at: now,
                updated_at: now,
            });
        Ok(entry.clone())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }
}
