//! Per-word mastery buckets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Points needed for each mastery level, index = level.
pub const DEFAULT_MASTERY_THRESHOLDS: [u32; 7] = [0, 1, 5, 15, 35, 70, 100];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MasteryThresholds(Vec<u32>);

impl MasteryThresholds {
    /// Thresholds must start at 0 and be strictly increasing.
    pub fn new(thresholds: Vec<u32>) -> Result<Self, ConfigError> {
        match thresholds.first() {
            None => return Err(ConfigError::NoLevels),
            Some(&first) if first != 0 => return Err(ConfigError::MasteryFloor(first)),
            Some(_) => {}
        }
        if let Some(level) = thresholds.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::UnorderedMastery { level: level + 1 });
        }
        Ok(Self(thresholds))
    }

    /// Number of mastery levels (`N`).
    pub fn level_count(&self) -> usize {
        self.0.len()
    }

    /// Highest reachable level (`N - 1`).
    pub fn max_level(&self) -> usize {
        self.0.len() - 1
    }

    /// Index of the largest threshold `<= points`.
    pub fn mastery_level(&self, points: u32) -> usize {
        self.0.partition_point(|&threshold| threshold <= points) - 1
    }
}

impl Default for MasteryThresholds {
    fn default() -> Self {
        Self(DEFAULT_MASTERY_THRESHOLDS.to_vec())
    }
}

/// How many words sit at each mastery level, ready for a bar chart.
///
/// Every level in `0..N` is present, with a count of zero when no word is
/// at that level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MasteryDistribution {
    pub x: Vec<usize>,
    pub y: Vec<usize>,
}

impl MasteryDistribution {
    pub fn from_levels(
        levels: impl IntoIterator<Item = usize>,
        thresholds: &MasteryThresholds,
    ) -> Self {
        let mut counts = level_counts(levels);
        for level in 0..thresholds.level_count() {
            counts.entry(level).or_insert(0);
        }
        let (x, y) = counts.into_iter().unzip();
        Self { x, y }
    }

    pub fn empty(thresholds: &MasteryThresholds) -> Self {
        Self::from_levels(std::iter::empty(), thresholds)
    }
}

pub(crate) fn level_counts(levels: impl IntoIterator<Item = usize>) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for level in levels {
        *counts.entry(level).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        let thresholds = MasteryThresholds::default();
        let cases = [
            (0, 0),
            (1, 1),
            (4, 1),
            (5, 2),
            (14, 2),
            (15, 3),
            (34, 3),
            (35, 4),
            (69, 4),
            (70, 5),
            (99, 5),
            (100, 6),
            (5000, 6),
        ];
        for (points, level) in cases {
            assert_eq!(thresholds.mastery_level(points), level, "points = {points}");
        }
    }

    #[test]
    fn test_monotonic() {
        let thresholds = MasteryThresholds::default();
        let mut previous = 0;
        for points in 0..=150 {
            let level = thresholds.mastery_level(points);
            assert!(level >= previous);
            previous = level;
        }
        assert_eq!(thresholds.max_level(), 6);
    }

    #[test]
    fn test_invalid_tables() {
        assert!(matches!(
            MasteryThresholds::new(vec![]),
            Err(ConfigError::NoLevels)
        ));
        assert!(matches!(
            MasteryThresholds::new(vec![1, 5]),
            Err(ConfigError::MasteryFloor(1))
        ));
        assert!(matches!(
            MasteryThresholds::new(vec![0, 5, 5, 10]),
            Err(ConfigError::UnorderedMastery { level: 2 })
        ));
        assert!(MasteryThresholds::new(vec![0, 10, 20]).is_ok());
    }

    #[test]
    fn test_distribution_is_dense() {
        let thresholds = MasteryThresholds::default();
        let chart = MasteryDistribution::from_levels([1, 1, 4, 6], &thresholds);
        assert_eq!(chart.x, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(chart.y, vec![0, 2, 0, 0, 1, 0, 1]);

        let chart = MasteryDistribution::empty(&thresholds);
        assert_eq!(chart.y, vec![0; 7]);
    }
}
