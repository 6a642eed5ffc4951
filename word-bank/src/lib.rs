pub mod api;
pub mod block_progress;
pub mod experience;
pub mod mastery;
pub mod scoring;

use serde::{Deserialize, Serialize};

pub use block_progress::{BlockProgress, block_mastery, is_fully_learned};
pub use experience::{ExperienceCurve, LevelProgress};
pub use mastery::{MasteryDistribution, MasteryThresholds};
pub use scoring::{PointRule, QuizMode, ScoredAnswer, apply_experience, score_answer};

pub type WordId = i64;
pub type BlockId = i64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("a progression table needs at least one level")]
    NoLevels,
    #[error("experience curve parameters must be finite (scale {scale}, offset {offset})")]
    NonFiniteCurve { scale: f64, offset: f64 },
    #[error("mastery thresholds must start at 0, found {0}")]
    MasteryFloor(u32),
    #[error("mastery threshold for level {level} is not above the previous one")]
    UnorderedMastery { level: usize },
}

/// The lookup tables every progression calculation runs against.
///
/// Built once at startup and shared read-only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressionConfig {
    pub experience: ExperienceCurve,
    pub mastery: MasteryThresholds,
}

impl ProgressionConfig {
    pub fn new(experience: ExperienceCurve, mastery: MasteryThresholds) -> Self {
        Self {
            experience,
            mastery,
        }
    }
}

/// A vocabulary word and its translation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
pub struct Word {
    pub id: WordId,
    pub name: String,
    pub transliteration: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Word {
    /// HTML shown under a correctly answered question: the example image
    /// followed by the example text. Empty if the word has neither.
    pub fn example_span(&self) -> String {
        let mut span = String::new();
        if let Some(image) = self.example_image.as_deref().filter(|s| !s.is_empty()) {
            span.push_str(&format!(
                "<img src=\"{}\" class=\"image-example\" alt=\"example_image\"> ",
                html_escape(image)
            ));
        }
        if let Some(example) = self.example.as_deref() {
            span.push_str(example);
        }
        span
    }
}

/// A named collection of words studied together.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theory: Option<String>,
}

pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word() -> Word {
        Word {
            id: 1,
            name: "ქალაქი".to_string(),
            transliteration: "kalaki".to_string(),
            translation: "city".to_string(),
            example: None,
            example_image: None,
            audio: None,
            image: None,
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Food & Drink"), "food-drink");
        assert_eq!(slugify("  Verbs -- part_2 "), "verbs-part-2");
        assert_eq!(slugify("Ünïcode Wörds"), "ünïcode-wörds");
    }

    #[test]
    fn test_example_span_empty() {
        assert_eq!(word().example_span(), "");
    }

    #[test]
    fn test_example_span_image_then_text() {
        let word = Word {
            example: Some("The city never sleeps.".to_string()),
            example_image: Some("/media/images/word_example/city.png".to_string()),
            ..word()
        };
        assert_eq!(
            word.example_span(),
            "<img src=\"/media/images/word_example/city.png\" class=\"image-example\" alt=\"example_image\"> The city never sleeps."
        );
    }

    #[test]
    fn test_example_span_text_only() {
        let word = Word {
            example: Some("A big city.".to_string()),
            ..word()
        };
        assert_eq!(word.example_span(), "A big city.");
    }

    #[test]
    fn test_default_config() {
        let config = ProgressionConfig::default();
        assert_eq!(config.experience.max_level(), experience::MAX_LEVEL);
        assert_eq!(config.mastery.level_count(), 7);
    }
}
