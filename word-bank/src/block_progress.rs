//! Block-level progress aggregated from a learner's word mastery levels.

use serde::{Deserialize, Serialize};

use crate::mastery::{MasteryDistribution, MasteryThresholds, level_counts};

/// Count-weighted average mastery over every word in a block.
///
/// `levels` holds the mastery level of each word the learner has attempted.
/// The denominator is the block's total word count, so words never attempted
/// pull the average down as if they were at level 0. No attempts (or an empty
/// block) gives 0.
pub fn block_mastery(levels: &[usize], total_words_in_block: usize) -> f64 {
    if levels.is_empty() || total_words_in_block == 0 {
        return 0.0;
    }
    let weighted: usize = level_counts(levels.iter().copied())
        .into_iter()
        .map(|(level, count)| level * count)
        .sum();
    weighted as f64 / total_words_in_block as f64
}

/// A block counts as fully learned once every one of its words has been
/// attempted at least once, whatever the mastery.
pub fn is_fully_learned(attempted_words: usize, total_words_in_block: usize) -> bool {
    attempted_words == total_words_in_block
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BlockProgress {
    /// Weighted mastery in `[0, N-1]`.
    pub mastery: f64,
    pub mastery_whole: u32,
    /// Fractional part of `mastery`, rounded to 3 places.
    pub mastery_fraction: f64,
    /// `mastery` as a percentage of the highest mastery level.
    pub mastery_pct: f64,
    pub num_learned_words: usize,
    pub total_words: usize,
    pub fully_learned: bool,
    pub chart: MasteryDistribution,
}

impl BlockProgress {
    /// Progress for a learner, or for an anonymous visitor when `learner_levels`
    /// is `None`.
    pub fn new(
        learner_levels: Option<&[usize]>,
        total_words: usize,
        thresholds: &MasteryThresholds,
    ) -> Self {
        let Some(levels) = learner_levels else {
            return Self {
                mastery: 0.0,
                mastery_whole: 0,
                mastery_fraction: 0.0,
                mastery_pct: 0.0,
                num_learned_words: 0,
                total_words,
                fully_learned: false,
                chart: MasteryDistribution::empty(thresholds),
            };
        };

        let mastery = block_mastery(levels, total_words);
        let whole = mastery.trunc();
        let mastery_pct = if thresholds.max_level() == 0 {
            0.0
        } else {
            mastery / thresholds.max_level() as f64 * 100.0
        };

        Self {
            mastery,
            mastery_whole: whole as u32,
            mastery_fraction: ((mastery - whole) * 1000.0).round() / 1000.0,
            mastery_pct,
            num_learned_words: levels.len(),
            total_words,
            fully_learned: is_fully_learned(levels.len(), total_words),
            chart: MasteryDistribution::from_levels(levels.iter().copied(), thresholds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_attempts() {
        assert_eq!(block_mastery(&[], 10), 0.0);
        assert_eq!(block_mastery(&[3, 4], 0), 0.0);
    }

    #[test]
    fn test_unattempted_words_count_in_denominator() {
        // 2 of 4 words attempted, at levels 2 and 4
        assert_eq!(block_mastery(&[2, 4], 4), 1.5);
        // same words, fully attempted block
        assert_eq!(block_mastery(&[2, 4], 2), 3.0);
    }

    #[test]
    fn test_maximum_only_when_everything_mastered() {
        let thresholds = MasteryThresholds::default();
        let top = thresholds.max_level();

        let all_top = vec![top; 5];
        assert_eq!(block_mastery(&all_top, 5), top as f64);
        assert!(block_mastery(&all_top[..4], 5) < top as f64);
        assert!(block_mastery(&[top, top, top, top, top - 1], 5) < top as f64);

        let progress = BlockProgress::new(Some(all_top.as_slice()), 5, &thresholds);
        assert_eq!(progress.mastery_pct, 100.0);
        assert!(progress.fully_learned);
    }

    #[test]
    fn test_fully_learned_is_about_attempts() {
        assert!(is_fully_learned(3, 3));
        assert!(!is_fully_learned(2, 3));

        let thresholds = MasteryThresholds::default();
        let progress = BlockProgress::new(Some(&[0, 0, 1][..]), 3, &thresholds);
        assert!(progress.fully_learned);
        assert!(progress.mastery < 1.0);
    }

    #[test]
    fn test_anonymous_progress() {
        let thresholds = MasteryThresholds::default();
        let progress = BlockProgress::new(None, 12, &thresholds);
        assert_eq!(progress.mastery, 0.0);
        assert!(!progress.fully_learned);
        assert_eq!(progress.num_learned_words, 0);
        assert_eq!(progress.chart.y, vec![0; 7]);
    }

    #[test]
    fn test_whole_and_fraction() {
        let thresholds = MasteryThresholds::default();
        // (1 + 2 + 5) / 3 = 2.6666...
        let progress = BlockProgress::new(Some(&[1, 2, 5][..]), 3, &thresholds);
        assert_eq!(progress.mastery_whole, 2);
        assert_eq!(progress.mastery_fraction, 0.667);
        assert_eq!(progress.num_learned_words, 3);
        assert_eq!(progress.chart.y, vec![0, 1, 1, 0, 0, 1, 0]);
    }
}
