use anyhow::{anyhow, Result};
use std::sync::Arc;

use super::achievement_rules;
use crate::models::{CheckAnswerRequest, CheckAnswerResponse, GameSession, GameSessionPatch};
use crate::storage::Storage;

pub struct AnswerService {
    storage: Arc<dyn Storage>,
}

impl AnswerService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Evaluates a submitted answer against the stored problem and applies
    /// the score/streak deltas to the caller's session. Returns `Ok(None)`
    /// when the problem id is unknown.
    pub async fn check_answer(
        &self,
        owner: Option<&str>,
        req: &CheckAnswerRequest,
    ) -> Result<Option<CheckAnswerResponse>> {
        let Some(problem) = self.storage.get_problem(&req.problem_id).await? else {
            return Ok(None);
        };

        let session = self.storage.get_or_create_session(owner).await?;
        let is_correct = req.selected_answer == problem.correct_answer;

        let patch = score_patch(&session, is_correct);
        let updated = self
            .storage
            .update_session(&session.id, &patch)
            .await?
            .ok_or_else(|| anyhow!("Session {} vanished during answer update", session.id))?;

        tracing::info!(
            "Answer processed: session={}, correct={}, score={}, streak={}",
            updated.id,
            is_correct,
            updated.score,
            updated.streak
        );

        let new_achievements =
            achievement_rules::unlock_new(self.storage.as_ref(), &updated, is_correct).await?;

        Ok(Some(CheckAnswerResponse {
            is_correct,
            correct_answer: problem.correct_answer,
            session: updated,
            new_achievements,
        }))
    }
}

/// Counter deltas for one submission. Correct: streak up, 10 base points plus
/// a 2-per-streak bonus computed on the incremented streak. Incorrect: streak
/// back to zero. `best_streak` only ever grows; `total_questions` always
/// counts the attempt.
fn score_patch(session: &GameSession, is_correct: bool) -> GameSessionPatch {
    let streak = if is_correct { session.streak + 1 } else { 0 };

    let mut patch = GameSessionPatch {
        streak: Some(streak),
        best_streak: Some(session.best_streak.max(streak)),
        total_questions: Some(session.total_questions + 1),
        ..GameSessionPatch::default()
    };

    if is_correct {
        patch.score = Some(session.score + 10 + streak * 2);
        patch.correct_answers = Some(session.correct_answers + 1);
    }

    patch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(score: i32, streak: i32, best_streak: i32) -> GameSession {
        let mut session = GameSession::new_default("s1".to_string(), None);
        session.score = score;
        session.streak = streak;
        session.best_streak = best_streak;
        session.correct_answers = 3;
        session.total_questions = 5;
        session
    }

    #[test]
    fn correct_answer_awards_base_plus_streak_bonus() {
        let patch = score_patch(&session_with(0, 0, 0), true);

        // First correct answer: 10 base + 2 * streak(1) = 12.
        assert_eq!(patch.score, Some(12));
        assert_eq!(patch.streak, Some(1));
        assert_eq!(patch.best_streak, Some(1));
        assert_eq!(patch.correct_answers, Some(4));
        assert_eq!(patch.total_questions, Some(6));
    }

    #[test]
    fn streak_bonus_uses_incremented_streak() {
        let patch = score_patch(&session_with(100, 4, 4), true);

        assert_eq!(patch.streak, Some(5));
        assert_eq!(patch.score, Some(100 + 10 + 10));
        assert_eq!(patch.best_streak, Some(5));
    }

    #[test]
    fn incorrect_answer_resets_streak_and_keeps_best() {
        let patch = score_patch(&session_with(100, 3, 7), false);

        assert_eq!(patch.streak, Some(0));
        assert_eq!(patch.best_streak, Some(7));
        assert_eq!(patch.score, None);
        assert_eq!(patch.correct_answers, None);
        assert_eq!(patch.total_questions, Some(6));
    }

    #[test]
    fn best_streak_never_decreases() {
        let patch = score_patch(&session_with(0, 2, 9), true);
        assert_eq!(patch.best_streak, Some(9));
    }
}
