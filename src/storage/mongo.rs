use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::{doc, to_bson, to_document, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions};
use mongodb::Database;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NewTutoringSession, Storage};
use crate::models::tutoring::{TutoringSession, TutoringSessionPatch, TutoringStatus};
use crate::models::user::{UpsertUser, User};
use crate::models::{
    Achievement, Difficulty, GameSession, GameSessionPatch, NewAchievement, NewProblem, Problem,
};

const PROBLEMS: &str = "game_problems";
const SESSIONS: &str = "game_sessions";
const ACHIEVEMENTS: &str = "achievements";
const TUTORING: &str = "tutoring_sessions";
const USERS: &str = "users";

// Serde converter for chrono::DateTime <-> mongodb::bson::DateTime
mod bson_datetime_as_chrono {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bson_dt = bson::DateTime::from_millis(date.timestamp_millis());
        bson_dt.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bson_dt = bson::DateTime::deserialize(deserializer)?;
        Ok(DateTime::from_timestamp_millis(bson_dt.timestamp_millis()).unwrap())
    }
}

fn bson_now() -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::from_millis(Utc::now().timestamp_millis())
}

// Persisted document shapes. Timestamps are native BSON datetimes so server
// sorts and range filters compare real instants; the API models keep plain
// chrono fields for the JSON wire format.

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProblemDoc {
    id: String,
    num1: i32,
    num2: i32,
    correct_answer: i32,
    difficulty: Difficulty,
    options: Vec<i32>,
    #[serde(with = "bson_datetime_as_chrono")]
    created_at: DateTime<Utc>,
}

impl From<Problem> for ProblemDoc {
    fn from(p: Problem) -> Self {
        ProblemDoc {
            id: p.id,
            num1: p.num1,
            num2: p.num2,
            correct_answer: p.correct_answer,
            difficulty: p.difficulty,
            options: p.options,
            created_at: p.created_at,
        }
    }
}

impl From<ProblemDoc> for Problem {
    fn from(d: ProblemDoc) -> Self {
        Problem {
            id: d.id,
            num1: d.num1,
            num2: d.num2,
            correct_answer: d.correct_answer,
            difficulty: d.difficulty,
            options: d.options,
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameSessionDoc {
    id: String,
    user_id: Option<String>,
    score: i32,
    streak: i32,
    best_streak: i32,
    correct_answers: i32,
    total_questions: i32,
    difficulty: Difficulty,
    sound_enabled: bool,
    questions_per_session: i32,
    timer_enabled: bool,
    timer_seconds: i32,
    #[serde(with = "bson_datetime_as_chrono")]
    created_at: DateTime<Utc>,
    #[serde(with = "bson_datetime_as_chrono")]
    updated_at: DateTime<Utc>,
}

impl From<GameSession> for GameSessionDoc {
    fn from(s: GameSession) -> Self {
        GameSessionDoc {
            id: s.id,
            user_id: s.user_id,
            score: s.score,
            streak: s.streak,
            best_streak: s.best_streak,
            correct_answers: s.correct_answers,
            total_questions: s.total_questions,
            difficulty: s.difficulty,
            sound_enabled: s.sound_enabled,
            questions_per_session: s.questions_per_session,
            timer_enabled: s.timer_enabled,
            timer_seconds: s.timer_seconds,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

impl From<GameSessionDoc> for GameSession {
    fn from(d: GameSessionDoc) -> Self {
        GameSession {
            id: d.id,
            user_id: d.user_id,
            score: d.score,
            streak: d.streak,
            best_streak: d.best_streak,
            correct_answers: d.correct_answers,
            total_questions: d.total_questions,
            difficulty: d.difficulty,
            sound_enabled: d.sound_enabled,
            questions_per_session: d.questions_per_session,
            timer_enabled: d.timer_enabled,
            timer_seconds: d.timer_seconds,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AchievementDoc {
    id: String,
    session_id: String,
    title: String,
    description: String,
    icon: String,
    color: String,
    #[serde(with = "bson_datetime_as_chrono")]
    unlocked_at: DateTime<Utc>,
}

impl From<Achievement> for AchievementDoc {
    fn from(a: Achievement) -> Self {
        AchievementDoc {
            id: a.id,
            session_id: a.session_id,
            title: a.title,
            description: a.description,
            icon: a.icon,
            color: a.color,
            unlocked_at: a.unlocked_at,
        }
    }
}

impl From<AchievementDoc> for Achievement {
    fn from(d: AchievementDoc) -> Self {
        Achievement {
            id: d.id,
            session_id: d.session_id,
            title: d.title,
            description: d.description,
            icon: d.icon,
            color: d.color,
            unlocked_at: d.unlocked_at,
        }
    }
}

/// `date` stays an ISO `yyyy-mm-dd` string: it is a calendar day, not an
/// instant, and the fixed-width form sorts correctly.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TutoringSessionDoc {
    id: String,
    user_id: Option<String>,
    week_number: i32,
    date: NaiveDate,
    student_name: String,
    topics_covered: Vec<String>,
    notes: Option<String>,
    duration: i32,
    status: TutoringStatus,
    #[serde(with = "bson_datetime_as_chrono")]
    created_at: DateTime<Utc>,
    #[serde(with = "bson_datetime_as_chrono")]
    updated_at: DateTime<Utc>,
}

impl From<TutoringSession> for TutoringSessionDoc {
    fn from(t: TutoringSession) -> Self {
        TutoringSessionDoc {
            id: t.id,
            user_id: t.user_id,
            week_number: t.week_number,
            date: t.date,
            student_name: t.student_name,
            topics_covered: t.topics_covered,
            notes: t.notes,
            duration: t.duration,
            status: t.status,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

impl From<TutoringSessionDoc> for TutoringSession {
    fn from(d: TutoringSessionDoc) -> Self {
        TutoringSession {
            id: d.id,
            user_id: d.user_id,
            week_number: d.week_number,
            date: d.date,
            student_name: d.student_name,
            topics_covered: d.topics_covered,
            notes: d.notes,
            duration: d.duration,
            status: d.status,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDoc {
    id: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    profile_image_url: Option<String>,
    is_admin: bool,
    #[serde(with = "bson_datetime_as_chrono")]
    created_at: DateTime<Utc>,
    #[serde(with = "bson_datetime_as_chrono")]
    updated_at: DateTime<Utc>,
}

impl From<UserDoc> for User {
    fn from(d: UserDoc) -> Self {
        User {
            id: d.id,
            email: d.email,
            first_name: d.first_name,
            last_name: d.last_name,
            profile_image_url: d.profile_image_url,
            is_admin: d.is_admin,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

/// MongoDB-backed store. Documents carry the same camelCase field names as
/// the API payloads; ids are UUID strings in an `id` field.
pub struct MongoStorage {
    mongo: Database,
}

impl MongoStorage {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn owner_filter(owner: Option<&str>) -> Document {
        match owner {
            Some(user_id) => doc! { "userId": user_id },
            None => doc! { "userId": Bson::Null },
        }
    }

    async fn find_tutoring(&self, filter: Document) -> Result<Vec<TutoringSession>> {
        let mut cursor = self
            .mongo
            .collection::<TutoringSessionDoc>(TUTORING)
            .find(filter)
            .sort(doc! { "date": -1, "createdAt": -1 })
            .await
            .context("Failed to query tutoring sessions")?;

        let mut records = Vec::new();
        while cursor.advance().await.context("Failed to advance cursor")? {
            records.push(
                cursor
                    .deserialize_current()
                    .context("Failed to deserialize tutoring session")?
                    .into(),
            );
        }
        Ok(records)
    }
}

fn session_patch_doc(patch: &GameSessionPatch) -> Result<Document> {
    let mut set = doc! {};
    if let Some(score) = patch.score {
        set.insert("score", score);
    }
    if let Some(streak) = patch.streak {
        set.insert("streak", streak);
    }
    if let Some(best_streak) = patch.best_streak {
        set.insert("bestStreak", best_streak);
    }
    if let Some(correct_answers) = patch.correct_answers {
        set.insert("correctAnswers", correct_answers);
    }
    if let Some(total_questions) = patch.total_questions {
        set.insert("totalQuestions", total_questions);
    }
    if let Some(difficulty) = patch.difficulty {
        set.insert("difficulty", to_bson(&difficulty)?);
    }
    if let Some(sound_enabled) = patch.sound_enabled {
        set.insert("soundEnabled", sound_enabled);
    }
    if let Some(questions_per_session) = patch.questions_per_session {
        set.insert("questionsPerSession", questions_per_session);
    }
    if let Some(timer_enabled) = patch.timer_enabled {
        set.insert("timerEnabled", timer_enabled);
    }
    if let Some(timer_seconds) = patch.timer_seconds {
        set.insert("timerSeconds", timer_seconds);
    }
    set.insert("updatedAt", bson_now());
    Ok(set)
}

fn tutoring_patch_doc(patch: &TutoringSessionPatch) -> Result<Document> {
    let mut set = doc! {};
    if let Some(week_number) = patch.week_number {
        set.insert("weekNumber", week_number);
    }
    if let Some(date) = patch.date {
        set.insert("date", to_bson(&date)?);
    }
    if let Some(ref student_name) = patch.student_name {
        set.insert("studentName", student_name.as_str());
    }
    if let Some(ref topics_covered) = patch.topics_covered {
        set.insert("topicsCovered", to_bson(topics_covered)?);
    }
    if let Some(ref notes) = patch.notes {
        set.insert("notes", notes.as_str());
    }
    if let Some(duration) = patch.duration {
        set.insert("duration", duration);
    }
    if let Some(status) = patch.status {
        set.insert("status", to_bson(&status)?);
    }
    set.insert("updatedAt", bson_now());
    Ok(set)
}

#[async_trait]
impl Storage for MongoStorage {
    async fn ping(&self) -> Result<()> {
        self.mongo
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
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

        self.mongo
            .collection::<ProblemDoc>(PROBLEMS)
            .insert_one(ProblemDoc::from(problem.clone()))
            .await
            .context("Failed to insert problem")?;

        Ok(problem)
    }

    async fn get_problem(&self, id: &str) -> Result<Option<Problem>> {
        Ok(self
            .mongo
            .collection::<ProblemDoc>(PROBLEMS)
            .find_one(doc! { "id": id })
            .await
            .context("Failed to query problem")?
            .map(Problem::from))
    }

    async fn get_or_create_session(&self, owner: Option<&str>) -> Result<GameSession> {
        let collection = self.mongo.collection::<GameSessionDoc>(SESSIONS);

        let defaults =
            GameSession::new_default(Uuid::new_v4().to_string(), owner.map(str::to_string));
        let mut on_insert = to_document(&GameSessionDoc::from(defaults))
            .context("Failed to serialize session")?;
        // The owner key comes from the filter on upsert; carrying it in
        // $setOnInsert as well would conflict.
        on_insert.remove("userId");

        // Single atomic conditional insert: concurrent first-time callers for
        // the same owner all get the one session the upsert settles on.
        let session = collection
            .find_one_and_update(
                Self::owner_filter(owner),
                doc! { "$setOnInsert": on_insert },
            )
            .with_options(
                FindOneAndUpdateOptions::builder()
                    .upsert(true)
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await
            .context("Failed to upsert session")?
            .ok_or_else(|| anyhow!("Session upsert returned no document"))?;

        Ok(session.into())
    }

    async fn update_session(
        &self,
        id: &str,
        patch: &GameSessionPatch,
    ) -> Result<Option<GameSession>> {
        let set = session_patch_doc(patch)?;

        Ok(self
            .mongo
            .collection::<GameSessionDoc>(SESSIONS)
            .find_one_and_update(doc! { "id": id }, doc! { "$set": set })
            .with_options(
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await
            .context("Failed to update session")?
            .map(GameSession::from))
    }

    async fn create_achievement_if_absent(
        &self,
        new: NewAchievement,
    ) -> Result<Option<Achievement>> {
        let collection = self.mongo.collection::<AchievementDoc>(ACHIEVEMENTS);

        let achievement = Achievement {
            id: Uuid::new_v4().to_string(),
            session_id: new.session_id,
            title: new.title,
            description: new.description,
            icon: new.icon,
            color: new.color,
            unlocked_at: Utc::now(),
        };

        let filter = doc! {
            "sessionId": &achievement.session_id,
            "title": &achievement.title,
        };
        let mut on_insert = to_document(&AchievementDoc::from(achievement.clone()))
            .context("Failed to serialize achievement")?;
        on_insert.remove("sessionId");
        on_insert.remove("title");

        // Upsert keyed by (session, title): the upserted_id tells us whether
        // this call actually unlocked the badge.
        let result = collection
            .update_one(filter, doc! { "$setOnInsert": on_insert })
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await
            .context("Failed to upsert achievement")?;

        if result.upserted_id.is_some() {
            Ok(Some(achievement))
        } else {
            Ok(None)
        }
    }

    async fn achievements_by_session(&self, session_id: &str) -> Result<Vec<Achievement>> {
        let mut cursor = self
            .mongo
            .collection::<AchievementDoc>(ACHIEVEMENTS)
            .find(doc! { "sessionId": session_id })
            .sort(doc! { "unlockedAt": 1 })
            .await
            .context("Failed to query achievements")?;

        let mut unlocked = Vec::new();
        while cursor.advance().await.context("Failed to advance cursor")? {
            unlocked.push(
                cursor
                    .deserialize_current()
                    .context("Failed to deserialize achievement")?
                    .into(),
            );
        }
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

        self.mongo
            .collection::<TutoringSessionDoc>(TUTORING)
            .insert_one(TutoringSessionDoc::from(record.clone()))
            .await
            .context("Failed to insert tutoring session")?;

        Ok(record)
    }

    async fn get_tutoring_session(
        &self,
        id: &str,
        owner: Option<&str>,
    ) -> Result<Option<TutoringSession>> {
        let mut filter = Self::owner_filter(owner);
        filter.insert("id", id);

        Ok(self
            .mongo
            .collection::<TutoringSessionDoc>(TUTORING)
            .find_one(filter)
            .await
            .context("Failed to query tutoring session")?
            .map(TutoringSession::from))
    }

    async fn list_tutoring_sessions(&self, owner: Option<&str>) -> Result<Vec<TutoringSession>> {
        self.find_tutoring(Self::owner_filter(owner)).await
    }

    async fn list_all_tutoring_sessions(&self) -> Result<Vec<TutoringSession>> {
        self.find_tutoring(doc! {}).await
    }

    async fn update_tutoring_session(
        &self,
        id: &str,
        owner: Option<&str>,
        patch: &TutoringSessionPatch,
    ) -> Result<Option<TutoringSession>> {
        let mut filter = Self::owner_filter(owner);
        filter.insert("id", id);
        let set = tutoring_patch_doc(patch)?;

        Ok(self
            .mongo
            .collection::<TutoringSessionDoc>(TUTORING)
            .find_one_and_update(filter, doc! { "$set": set })
            .with_options(
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await
            .context("Failed to update tutoring session")?
            .map(TutoringSession::from))
    }

    async fn delete_tutoring_session(&self, id: &str, owner: Option<&str>) -> Result<bool> {
        let mut filter = Self::owner_filter(owner);
        filter.insert("id", id);

        let result = self
            .mongo
            .collection::<TutoringSessionDoc>(TUTORING)
            .delete_one(filter)
            .await
            .context("Failed to delete tutoring session")?;

        Ok(result.deleted_count > 0)
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<User> {
        let collection = self.mongo.collection::<UserDoc>(USERS);

        let set = doc! {
            "email": user.email.as_deref().map(Bson::from).unwrap_or(Bson::Null),
            "firstName": user.first_name.as_deref().map(Bson::from).unwrap_or(Bson::Null),
            "lastName": user.last_name.as_deref().map(Bson::from).unwrap_or(Bson::Null),
            "profileImageUrl": user.profile_image_url.as_deref().map(Bson::from).unwrap_or(Bson::Null),
            "isAdmin": user.is_admin,
            "updatedAt": bson_now(),
        };
        let on_insert = doc! { "createdAt": bson_now() };

        let stored = collection
            .find_one_and_update(
                doc! { "id": &user.id },
                doc! { "$set": set, "$setOnInsert": on_insert },
            )
            .with_options(
                FindOneAndUpdateOptions::builder()
                    .upsert(true)
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await
            .context("Failed to upsert user")?
            .ok_or_else(|| anyhow!("User upsert returned no document"))?;

        Ok(stored.into())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut cursor = self
            .mongo
            .collection::<UserDoc>(USERS)
            .find(doc! {})
            .sort(doc! { "createdAt": 1 })
            .await
            .context("Failed to query users")?;

        let mut users = Vec::new();
        while cursor.advance().await.context("Failed to advance cursor")? {
            users.push(
                cursor
                    .deserialize_current()
                    .context("Failed to deserialize user")?
                    .into(),
            );
        }
        Ok(users)
    }
}
