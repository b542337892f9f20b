use anyhow::Result;

use crate::models::{Achievement, GameSession, NewAchievement};
use crate::storage::Storage;

/// Static description of an unlockable badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementSpec {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

const FIRST_VICTORY: AchievementSpec = AchievementSpec {
    title: "First Victory",
    description: "Answered your first question correctly",
    icon: "⭐",
    color: "accent",
};

const HOT_STREAK: AchievementSpec = AchievementSpec {
    title: "Hot Streak",
    description: "Reached a 5-question streak",
    icon: "🔥",
    color: "secondary",
};

const PERFECT_SCORE: AchievementSpec = AchievementSpec {
    title: "Perfect Score",
    description: "Got 10 questions correct in a row",
    icon: "💯",
    color: "primary",
};

/// Rules evaluated against the session counters after every answer. Each
/// rule is a pure threshold check; duplicate suppression happens in the
/// store, so re-checking on every call is safe.
pub fn triggered(session: &GameSession, is_correct: bool) -> Vec<AchievementSpec> {
    let mut specs = Vec::new();

    if is_correct && session.correct_answers == 1 {
        specs.push(FIRST_VICTORY);
    }
    if session.streak == 5 {
        specs.push(HOT_STREAK);
    }
    if session.streak == 10 {
        specs.push(PERFECT_SCORE);
    }

    specs
}

/// Runs the rule set and persists any badge not yet unlocked for this
/// session. Returns only the achievements created by this call.
pub async fn unlock_new(
    storage: &dyn Storage,
    session: &GameSession,
    is_correct: bool,
) -> Result<Vec<Achievement>> {
    let mut unlocked = Vec::new();

    for spec in triggered(session, is_correct) {
        let created = storage
            .create_achievement_if_absent(NewAchievement {
                session_id: session.id.clone(),
                title: spec.title.to_string(),
                description: spec.description.to_string(),
                icon: spec.icon.to_string(),
                color: spec.color.to_string(),
            })
            .await?;

        if let Some(achievement) = created {
            tracing::info!(
                "Unlocked achievement '{}' for session {}",
                achievement.title,
                session.id
            );
            unlocked.push(achievement);
        }
    }

    Ok(unlocked)
}
