use autobus_types::{Answers, CATEGORY_COUNT, CorrectionMark, Corrections, Player};
use serde::Serialize;
use tracing::debug;

pub const POINTS_PER_CORRECT: u32 = 10;
pub const PERFECT_ROUND_BONUS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub player: Player,
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Score a round from the player's own correction marks.
    ///
    /// Each category marked correct is worth 10 points, and a perfect round
    /// (all 8 marked correct) earns a further 20. Marks are trusted as given:
    /// a blank answer marked correct still counts.
    pub fn compute_score(answers: &Answers, corrections: &Corrections) -> u32 {
        let correct = Self::correct_count(corrections);
        let mut score = correct as u32 * POINTS_PER_CORRECT;

        if correct == CATEGORY_COUNT {
            score += PERFECT_ROUND_BONUS;
        }

        debug!(
            answered = Self::answered_count(answers),
            correct, score, "computed round score"
        );
        score
    }

    pub fn correct_count(corrections: &Corrections) -> usize {
        corrections
            .values()
            .filter(|mark| **mark == CorrectionMark::Correct)
            .count()
    }

    pub fn answered_count(answers: &Answers) -> usize {
        answers.values().filter(|a| !a.trim().is_empty()).count()
    }

    /// Share of categories with a non-blank answer, as a whole percentage.
    pub fn completion_percentage(answers: &Answers) -> u8 {
        let filled = Self::answered_count(answers) as f64;
        ((filled / CATEGORY_COUNT as f64) * 100.0).round() as u8
    }

    /// Highest score first; ties keep join order.
    pub fn leaderboard(players: &[Player]) -> Vec<LeaderboardEntry> {
        let mut ordered: Vec<&Player> = players.iter().collect();
        ordered.sort_by(|a, b| b.score.cmp(&a.score));

        ordered
            .into_iter()
            .enumerate()
            .map(|(index, player)| LeaderboardEntry {
                rank: (index + 1) as u32,
                player: player.clone(),
            })
            .collect()
    }
}
