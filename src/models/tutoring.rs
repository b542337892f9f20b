use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lifecycle of a logged tutoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TutoringStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

/// User-entered tutoring log record. Independent of game data; owned by the
/// identity that created it (`user_id: None` for anonymous entries).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutoringSession {
    pub id: String,
    pub user_id: Option<String>,
    pub week_number: i32,
    pub date: NaiveDate,
    pub student_name: String,
    pub topics_covered: Vec<String>,
    pub notes: Option<String>,
    pub duration: i32,
    pub status: TutoringStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTutoringSessionRequest {
    #[validate(range(min = 1, max = 52, message = "weekNumber must be 1..=52"))]
    pub week_number: i32,

    pub date: NaiveDate,

    #[validate(length(min = 1, max = 100, message = "studentName must be 1..=100 characters"))]
    pub student_name: String,

    #[serde(default)]
    pub topics_covered: Vec<String>,

    pub notes: Option<String>,

    /// Duration in minutes.
    #[validate(range(min = 1, max = 480, message = "duration must be 1..=480 minutes"))]
    pub duration: i32,

    pub status: Option<TutoringStatus>,
}

/// Partial update with merge semantics: unset fields are retained.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TutoringSessionPatch {
    #[validate(range(min = 1, max = 52, message = "weekNumber must be 1..=52"))]
    pub week_number: Option<i32>,

    pub date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 100, message = "studentName must be 1..=100 characters"))]
    pub student_name: Option<String>,

    pub topics_covered: Option<Vec<String>>,

    pub notes: Option<String>,

    #[validate(range(min = 1, max = 480, message = "duration must be 1..=480 minutes"))]
    pub duration: Option<i32>,

    pub status: Option<TutoringStatus>,
}

impl TutoringSessionPatch {
    pub fn apply(&self, record: &mut TutoringSession) {
        if let Some(week_number) = self.week_number {
            record.week_number = week_number;
        }
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(ref student_name) = self.student_name {
            record.student_name = student_name.clone();
        }
        if let Some(ref topics_covered) = self.topics_covered {
            record.topics_covered = topics_covered.clone();
        }
        if let Some(ref notes) = self.notes {
            record.notes = Some(notes.clone());
        }
        if let Some(duration) = self.duration {
            record.duration = duration;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        record.updated_at = Utc::now();
    }
}
