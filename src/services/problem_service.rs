use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

use crate::models::{Difficulty, NewProblem, Problem};
use crate::storage::Storage;

/// How many rejection-sampling draws to spend on distractors before falling
/// back to deterministic offsets. On the easy tier the candidate space is
/// small and duplicates are common.
const MAX_DISTRACTOR_ATTEMPTS: u32 = 32;

pub struct ProblemService {
    storage: Arc<dyn Storage>,
}

impl ProblemService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn generate(&self, difficulty: Difficulty) -> Result<Problem> {
        let new = generate_problem(difficulty);
        let problem = self.storage.create_problem(new).await?;

        tracing::info!(
            "Generated problem {}: {}x{} ({})",
            problem.id,
            problem.num1,
            problem.num2,
            difficulty.as_str()
        );
        Ok(problem)
    }
}

/// Builds a random multiplication problem for a tier: operands uniform in
/// [1, ceiling], 3 distinct positive distractors, options shuffled.
pub fn generate_problem(difficulty: Difficulty) -> NewProblem {
    let mut rng = rand::rng();
    let ceiling = difficulty.max_operand();

    let num1 = rng.random_range(1..=ceiling);
    let num2 = rng.random_range(1..=ceiling);
    let correct_answer = num1 * num2;

    let mut options = vec![correct_answer];
    options.extend(distractors(correct_answer, ceiling, &mut rng));
    options.shuffle(&mut rng);

    NewProblem {
        num1,
        num2,
        correct_answer,
        difficulty,
        options,
    }
}

/// Half the candidates are near misses (within 10 of the answer), half are
/// uniform over the tier's product range. A candidate is rejected if it is
/// non-positive, equals the answer, or duplicates an accepted distractor.
fn distractors(correct_answer: i32, ceiling: i32, rng: &mut impl Rng) -> Vec<i32> {
    let mut picked: Vec<i32> = Vec::with_capacity(3);
    let mut attempts = 0;

    while picked.len() < 3 && attempts < MAX_DISTRACTOR_ATTEMPTS {
        attempts += 1;

        let candidate = if rng.random_bool(0.5) {
            correct_answer + rng.random_range(-10..10)
        } else {
            rng.random_range(1..=ceiling * ceiling)
        };

        if candidate > 0 && candidate != correct_answer && !picked.contains(&candidate) {
            picked.push(candidate);
        }
    }

    // Deterministic fallback: widening offsets around the answer are distinct
    // by construction, so this always terminates.
    let mut offset = 1;
    while picked.len() < 3 {
        for candidate in [correct_answer + offset, correct_answer - offset] {
            if picked.len() < 3
                && candidate > 0
                && candidate != correct_answer
                && !picked.contains(&candidate)
            {
                picked.push(candidate);
            }
        }
        offset += 1;
    }

    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TIERS: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    #[test]
    fn options_are_four_distinct_positive_values() {
        for difficulty in ALL_TIERS {
            for _ in 0..500 {
                let problem = generate_problem(difficulty);

                assert_eq!(problem.options.len(), 4);
                assert!(problem.options.iter().all(|&o| o > 0));

                let mut unique = problem.options.clone();
                unique.sort_unstable();
                unique.dedup();
                assert_eq!(unique.len(), 4, "duplicate option in {:?}", problem.options);
            }
        }
    }

    #[test]
    fn correct_answer_appears_exactly_once() {
        for difficulty in ALL_TIERS {
            for _ in 0..500 {
                let problem = generate_problem(difficulty);

                assert_eq!(problem.correct_answer, problem.num1 * problem.num2);
                let occurrences = problem
                    .options
                    .iter()
                    .filter(|&&o| o == problem.correct_answer)
                    .count();
                assert_eq!(occurrences, 1);
            }
        }
    }

    #[test]
    fn operands_stay_within_tier_ceiling() {
        for difficulty in ALL_TIERS {
            let ceiling = difficulty.max_operand();
            for _ in 0..200 {
                let problem = generate_problem(difficulty);
                assert!((1..=ceiling).contains(&problem.num1));
                assert!((1..=ceiling).contains(&problem.num2));
            }
        }
    }

    #[test]
    fn fallback_produces_distinct_distractors_for_smallest_answer() {
        // correct_answer = 1 on the easy tier is the tightest candidate
        // space; the fallback must still find 3 distinct positive values.
        let mut rng = rand::rng();
        for _ in 0..200 {
            let picked = distractors(1, 5, &mut rng);
            assert_eq!(picked.len(), 3);
            assert!(picked.iter().all(|&d| d > 0 && d != 1));
        }
    }
}
