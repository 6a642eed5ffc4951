use serde::{Deserialize, Serialize};

pub const MIN_POINTS: u32 = 0;
pub const MAX_POINTS: u32 = 100;

/// Points a word starts with when it is first marked as learned.
pub const LEARNED_WORD_POINTS: u32 = 1;

/// How far a word's points move on a correct or incorrect answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointRule {
    pub increase_by: u32,
    pub decrease_by: u32,
}

impl Default for PointRule {
    fn default() -> Self {
        Self {
            increase_by: 1,
            decrease_by: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoredAnswer {
    pub is_correct: bool,
    pub points: u32,
}

/// Answers are compared exactly: no trimming, no case folding.
pub fn is_correct_answer(user_answer: &str, correct_answer: &str) -> bool {
    user_answer == correct_answer
}

/// Score an answer against a word's current points.
///
/// The result always stays within `MIN_POINTS..=MAX_POINTS`, however large the
/// rule's steps are.
pub fn score_answer(
    user_answer: &str,
    correct_answer: &str,
    current_points: u32,
    rule: PointRule,
) -> ScoredAnswer {
    let is_correct = is_correct_answer(user_answer, correct_answer);
    let points = if is_correct {
        current_points.saturating_add(rule.increase_by)
    } else {
        current_points.saturating_sub(rule.decrease_by)
    };
    ScoredAnswer {
        is_correct,
        points: points.clamp(MIN_POINTS, MAX_POINTS),
    }
}

/// Apply a signed experience change, never going below zero.
pub fn apply_experience(experience: u64, delta: i64) -> u64 {
    if delta >= 0 {
        experience.saturating_add(delta.unsigned_abs())
    } else {
        experience.saturating_sub(delta.unsigned_abs())
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    parse_display::Display,
    parse_display::FromStr,
)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    /// First encounter with new words.
    Learn,
    /// Drill with generated wrong options.
    MultipleChoice,
    /// Words the user has already seen.
    Review,
}

impl QuizMode {
    /// How answers move a word's points in this mode.
    ///
    /// `Learn` has no answers to score: words are marked as learned instead.
    pub fn point_rule(self) -> Option<PointRule> {
        match self {
            QuizMode::Learn => None,
            QuizMode::MultipleChoice => Some(PointRule {
                increase_by: 2,
                decrease_by: 1,
            }),
            QuizMode::Review => Some(PointRule {
                increase_by: 1,
                decrease_by: 1,
            }),
        }
    }

    /// Experience granted for a correct answer (or a newly learned word).
    pub fn experience_reward(self) -> u64 {
        match self {
            QuizMode::Learn => 1,
            QuizMode::MultipleChoice => 2,
            QuizMode::Review => 1,
        }
    }

    pub fn requires_identity(self) -> bool {
        matches!(self, QuizMode::Review)
    }
}
