//! Account-wide experience curve.
//!
//! Every level costs `max(1, ceil(scale * ln(level) + offset))` experience on
//! top of the previous one, so early levels come quickly and later ones slow
//! down logarithmically. The table is computed once and never mutated.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const MAX_LEVEL: u32 = 100;
pub const CURVE_SCALE: f64 = 24.3;
pub const CURVE_OFFSET: f64 = -9.8;

/// Experience needed to go from `level - 1` to `level`.
///
/// Level 0 is free. Every other level costs at least 1 so that cumulative
/// thresholds are strictly increasing and `level()` is never ambiguous.
pub fn increment_formula(level: u32, scale: f64, offset: f64) -> u64 {
    if level == 0 {
        return 0;
    }
    let raw = scale * f64::from(level).ln() + offset;
    raw.ceil().max(1.0) as u64
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExperienceCurve {
    /// `increments[level]`, with `increments[0] == 0`.
    increments: Vec<u64>,
    /// `cumulative[level]`, with `cumulative[0] == 0`.
    cumulative: Vec<u64>,
}

impl ExperienceCurve {
    pub fn new(max_level: u32, scale: f64, offset: f64) -> Result<Self, ConfigError> {
        if max_level == 0 {
            return Err(ConfigError::NoLevels);
        }
        if !scale.is_finite() || !offset.is_finite() {
            return Err(ConfigError::NonFiniteCurve { scale, offset });
        }
        Ok(Self::build(max_level, scale, offset))
    }

    fn build(max_level: u32, scale: f64, offset: f64) -> Self {
        let increments: Vec<u64> = (0..=max_level)
            .map(|level| increment_formula(level, scale, offset))
            .collect();
        let cumulative = increments
            .iter()
            .scan(0u64, |total, increment| {
                *total = total.saturating_add(*increment);
                Some(*total)
            })
            .collect();
        Self {
            increments,
            cumulative,
        }
    }

    pub fn max_level(&self) -> u32 {
        (self.cumulative.len() - 1) as u32
    }

    /// Incremental experience for `level`, or `None` past the maximum level.
    pub fn increment_for_level(&self, level: u32) -> Option<u64> {
        self.increments.get(level as usize).copied()
    }

    /// Total experience needed to reach `level`, or `None` past the maximum level.
    pub fn cumulative_xp(&self, level: u32) -> Option<u64> {
        self.cumulative.get(level as usize).copied()
    }

    /// The largest level whose cumulative threshold is `<= experience`.
    pub fn level(&self, experience: u64) -> u32 {
        // cumulative[0] == 0, so the partition point is at least 1
        let reached = self.cumulative.partition_point(|&xp| xp <= experience);
        (reached - 1) as u32
    }

    /// Fraction of the current level already earned, in `[0, 1)`.
    ///
    /// At the maximum level there is nothing left to earn and this is `1.0`.
    pub fn level_progress(&self, experience: u64) -> f64 {
        let level = self.level(experience);
        if level >= self.max_level() {
            return 1.0;
        }
        let earned = experience - self.cumulative[level as usize];
        let needed = self.increments[level as usize + 1];
        earned as f64 / needed as f64
    }

    pub fn xp_to_next_level(&self, experience: u64) -> u64 {
        let level = self.level(experience);
        if level >= self.max_level() {
            return 0;
        }
        self.cumulative[level as usize + 1] - experience
    }

    pub fn progress(&self, experience: u64) -> LevelProgress {
        LevelProgress {
            experience,
            level: self.level(experience),
            level_progress: self.level_progress(experience),
            xp_to_next_level: self.xp_to_next_level(experience),
        }
    }
}

impl Default for ExperienceCurve {
    fn default() -> Self {
        Self::build(MAX_LEVEL, CURVE_SCALE, CURVE_OFFSET)
    }
}

/// Level information derived from a profile's experience.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LevelProgress {
    pub experience: u64,
    pub level: u32,
    pub level_progress: f64,
    pub xp_to_next_level: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_increments() {
        let curve = ExperienceCurve::default();
        let increments: Vec<u64> = (0..=5)
            .map(|level| curve.increment_for_level(level).unwrap())
            .collect();
        assert_eq!(increments, vec![0, 1, 8, 17, 24, 30]);

        let cumulative: Vec<u64> = (0..=5)
            .map(|level| curve.cumulative_xp(level).unwrap())
            .collect();
        assert_eq!(cumulative, vec![0, 1, 9, 26, 50, 80]);
    }

    #[test]
    fn test_cumulative_strictly_increasing() {
        let curve = ExperienceCurve::default();
        assert_eq!(curve.max_level(), MAX_LEVEL);
        for level in 1..=MAX_LEVEL {
            assert!(
                curve.cumulative_xp(level).unwrap() > curve.cumulative_xp(level - 1).unwrap(),
                "level {level} costs no experience"
            );
        }
        assert_eq!(curve.cumulative_xp(MAX_LEVEL + 1), None);
    }

    #[test]
    fn test_minimum_increment_is_one() {
        // a steep negative offset would round early levels to zero or below
        let curve = ExperienceCurve::new(10, 1.0, -50.0).unwrap();
        for level in 1..=10 {
            assert_eq!(curve.increment_for_level(level), Some(1));
        }
        assert_eq!(curve.level(3), 3);
    }

    #[test]
    fn test_level_brackets_experience() {
        let curve = ExperienceCurve::default();
        let top = curve.cumulative_xp(MAX_LEVEL).unwrap();
        for experience in (0..top + 500).step_by(7) {
            let level = curve.level(experience);
            assert!(curve.cumulative_xp(level).unwrap() <= experience);
            if level < MAX_LEVEL {
                assert!(experience < curve.cumulative_xp(level + 1).unwrap());
            }
        }
    }

    #[test]
    fn test_fresh_profile() {
        let curve = ExperienceCurve::default();
        assert_eq!(
            curve.progress(0),
            LevelProgress {
                experience: 0,
                level: 0,
                level_progress: 0.0,
                xp_to_next_level: 1,
            }
        );
    }

    #[test]
    fn test_progress_within_level() {
        let curve = ExperienceCurve::default();

        let progress = curve.progress(70);
        assert_eq!(progress.level, 4);
        assert!((progress.level_progress - 0.667).abs() < 1e-3);
        assert_eq!(progress.xp_to_next_level, 10);

        let progress = curve.progress(49);
        assert_eq!(progress.level, 3);
        assert!((progress.level_progress - 0.958).abs() < 1e-3);
        assert_eq!(progress.xp_to_next_level, 1);

        let progress = curve.progress(50);
        assert_eq!(progress.level, 4);
        assert_eq!(progress.level_progress, 0.0);
        assert_eq!(progress.xp_to_next_level, 30);
    }

    #[test]
    fn test_max_level_is_capped() {
        let curve = ExperienceCurve::default();
        let top = curve.cumulative_xp(MAX_LEVEL).unwrap();

        assert_eq!(curve.level(top - 1), MAX_LEVEL - 1);
        for experience in [top, top + 1, u64::MAX] {
            assert_eq!(curve.level(experience), MAX_LEVEL);
            assert_eq!(curve.level_progress(experience), 1.0);
            assert_eq!(curve.xp_to_next_level(experience), 0);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            ExperienceCurve::new(0, CURVE_SCALE, CURVE_OFFSET),
            Err(ConfigError::NoLevels)
        ));
        assert!(matches!(
            ExperienceCurve::new(10, f64::NAN, CURVE_OFFSET),
            Err(ConfigError::NonFiniteCurve { .. })
        ));
    }
}
