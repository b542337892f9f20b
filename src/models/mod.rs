use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod tutoring;
pub mod user;

/// Difficulty tier for generated problems. The tier maps to the largest
/// operand a problem may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub fn max_operand(self) -> i32 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Medium => 10,
            Difficulty::Hard => 12,
            Difficulty::Expert => 20,
        }
    }

    /// Path segments are forgiving: an unknown tier falls back to easy.
    pub fn parse_or_easy(value: &str) -> Self {
        match value {
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            "expert" => Difficulty::Expert,
            _ => Difficulty::Easy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

/// A generated multiplication problem. Immutable once created; the evaluator
/// reads it back by id when the answer comes in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: String,
    pub num1: i32,
    pub num2: i32,
    pub correct_answer: i32,
    pub difficulty: Difficulty,
    /// Exactly 4 options: the correct answer plus 3 distinct distractors.
    pub options: Vec<i32>,
    pub created_at: DateTime<Utc>,
}

/// Problem fields as produced by the generator, before the store assigns an
/// id and timestamp.
#[derive(Debug, Clone)]
pub struct NewProblem {
    pub num1: i32,
    pub num2: i32,
    pub correct_answer: i32,
    pub difficulty: Difficulty,
    pub options: Vec<i32>,
}

/// Per-owner game session: score/streak counters plus client settings.
/// `user_id` is `None` for the anonymous session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: String,
    pub user_id: Option<String>,
    pub score: i32,
    pub streak: i32,
    pub best_streak: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub difficulty: Difficulty,
    pub sound_enabled: bool,
    pub questions_per_session: i32,
    pub timer_enabled: bool,
    pub timer_seconds: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameSession {
    pub fn new_default(id: String, user_id: Option<String>) -> Self {
        let now = Utc::now();
        GameSession {
            id,
            user_id,
            score: 0,
            streak: 0,
            best_streak: 0,
            correct_answers: 0,
            total_questions: 0,
            difficulty: Difficulty::Easy,
            sound_enabled: true,
            questions_per_session: 10,
            timer_enabled: false,
            timer_seconds: 30,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Explicit partial update for a game session. Unset fields are retained on
/// merge; this is the only way session state is mutated after creation.
/// Counter fields are reserved for the answer and reset paths; the settings
/// endpoint rejects patches that touch them.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionPatch {
    pub score: Option<i32>,
    pub streak: Option<i32>,
    pub best_streak: Option<i32>,
    pub correct_answers: Option<i32>,
    pub total_questions: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub sound_enabled: Option<bool>,
    #[validate(range(min = 1, max = 100, message = "questionsPerSession must be 1..=100"))]
    pub questions_per_session: Option<i32>,
    pub timer_enabled: Option<bool>,
    #[validate(range(min = 5, max = 300, message = "timerSeconds must be 5..=300"))]
    pub timer_seconds: Option<i32>,
}

impl GameSessionPatch {
    /// Patch that zeroes every progress counter and leaves settings alone.
    pub fn reset_progress() -> Self {
        GameSessionPatch {
            score: Some(0),
            streak: Some(0),
            best_streak: Some(0),
            correct_answers: Some(0),
            total_questions: Some(0),
            ..GameSessionPatch::default()
        }
    }

    /// True when the patch writes any progress counter. A client writing
    /// `streak` past `bestStreak` would break the counter ordering, so these
    /// fields are not settable over the API.
    pub fn touches_counters(&self) -> bool {
        self.score.is_some()
            || self.streak.is_some()
            || self.best_streak.is_some()
            || self.correct_answers.is_some()
            || self.total_questions.is_some()
    }

    /// Merge into an existing session. Touches `updated_at`.
    pub fn apply(&self, session: &mut GameSession) {
        if let Some(score) = self.score {
            session.score = score;
        }
        if let Some(streak) = self.streak {
            session.streak = streak;
        }
        if let Some(best_streak) = self.best_streak {
            session.best_streak = best_streak;
        }
        if let Some(correct_answers) = self.correct_answers {
            session.correct_answers = correct_answers;
        }
        if let Some(total_questions) = self.total_questions {
            session.total_questions = total_questions;
        }
        if let Some(difficulty) = self.difficulty {
            session.difficulty = difficulty;
        }
        if let Some(sound_enabled) = self.sound_enabled {
            session.sound_enabled = sound_enabled;
        }
        if let Some(questions_per_session) = self.questions_per_session {
            session.questions_per_session = questions_per_session;
        }
        if let Some(timer_enabled) = self.timer_enabled {
            session.timer_enabled = timer_enabled;
        }
        if let Some(timer_seconds) = self.timer_seconds {
            session.timer_seconds = timer_seconds;
        }
        session.updated_at = Utc::now();
    }
}

/// Badge unlocked for a session. Append-only; unique by (session, title).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub session_id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub unlocked_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAchievement {
    pub session_id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerRequest {
    pub problem_id: String,
    pub selected_answer: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerResponse {
    pub is_correct: bool,
    pub correct_answer: i32,
    pub session: GameSession,
    pub new_achievements: Vec<Achievement>,
}

/// Session plus everything it has unlocked, as returned by GET /api/session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverview {
    pub session: GameSession,
    pub achievements: Vec<Achievement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_difficulty_falls_back_to_easy() {
        assert_eq!(Difficulty::parse_or_easy("expert"), Difficulty::Expert);
        assert_eq!(Difficulty::parse_or_easy("nightmare"), Difficulty::Easy);
        assert_eq!(Difficulty::parse_or_easy(""), Difficulty::Easy);
    }

    #[test]
    fn reset_patch_preserves_settings() {
        let mut session = GameSession::new_default("s1".to_string(), None);
        session.score = 120;
        session.streak = 4;
        session.best_streak = 7;
        session.correct_answers = 11;
        session.total_questions = 15;
        session.difficulty = Difficulty::Hard;
        session.timer_enabled = true;

        GameSessionPatch::reset_progress().apply(&mut session);

        assert_eq!(session.score, 0);
        assert_eq!(session.streak, 0);
        assert_eq!(session.best_streak, 0);
        assert_eq!(session.correct_answers, 0);
        assert_eq!(session.total_questions, 0);
        assert_eq!(session.difficulty, Difficulty::Hard);
        assert!(session.timer_enabled);
    }

    #[test]
    fn patch_reports_counter_writes() {
        assert!(!GameSessionPatch::default().touches_counters());
        assert!(GameSessionPatch::reset_progress().touches_counters());

        let patch = GameSessionPatch {
            streak: Some(3),
            ..GameSessionPatch::default()
        };
        assert!(patch.touches_counters());

        let settings_only = GameSessionPatch {
            difficulty: Some(Difficulty::Hard),
            timer_seconds: Some(60),
            ..GameSessionPatch::default()
        };
        assert!(!settings_only.touches_counters());
    }

    #[test]
    fn patch_merge_retains_unset_fields() {
        let mut session = GameSession::new_default("s1".to_string(), None);
        session.score = 50;

        let patch = GameSessionPatch {
            difficulty: Some(Difficulty::Medium),
            sound_enabled: Some(false),
            ..GameSessionPatch::default()
        };
        patch.apply(&mut session);

        assert_eq!(session.score, 50);
        assert_eq!(session.difficulty, Difficulty::Medium);
        assert!(!session.sound_enabled);
    }
}
