//! Request and response bodies of the quiz service.

use serde::{Deserialize, Serialize};

use crate::{Block, BlockProgress, LevelProgress, QuizMode, Word, WordId};

#[derive(Debug, Serialize, Deserialize, Clone, schemars::JsonSchema)]
pub struct BuildQuizRequest {
    /// Quiz mode tag; kept as text so an unknown mode is reported as such.
    pub quiz_type: String,
    pub learning_block: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, schemars::JsonSchema)]
pub struct Quiz {
    pub quiz_type: QuizMode,
    pub learning_block: Block,
    pub questions: Vec<Question>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, schemars::JsonSchema)]
pub struct Question {
    pub question_id: WordId,
    pub name: String,
    pub transliteration: String,
    /// Only revealed while learning new words.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, schemars::JsonSchema)]
pub struct CheckAnswerRequest {
    pub quiz_type: String,
    pub question_id: WordId,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, schemars::JsonSchema)]
pub struct CheckAnswerResponse {
    pub is_correct: bool,
    pub example_span: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, schemars::JsonSchema)]
pub struct AddToLearnedRequest {
    pub question_id: WordId,
    #[serde(default)]
    pub is_last: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, schemars::JsonSchema)]
pub struct AddToLearnedResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_word_id: Option<i64>,
    pub is_last: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, schemars::JsonSchema)]
pub struct ProfileProgress {
    #[serde(flatten)]
    pub level: LevelProgress,
    pub num_learned_words: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, schemars::JsonSchema)]
pub struct BlockSummary {
    #[serde(flatten)]
    pub block: Block,
    pub fully_learned: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, schemars::JsonSchema)]
pub struct BlockDetail {
    pub block: Block,
    pub words: Vec<Word>,
    pub progress: BlockProgress,
}

#[derive(Debug, Serialize, Deserialize, Clone, schemars::JsonSchema)]
pub struct QuizResultsRequest {
    pub learning_block: String,
    pub quiz_type: String,
    #[serde(default)]
    pub quiz_words: Vec<WordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_questions: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, schemars::JsonSchema)]
pub struct QuizResults {
    pub learning_block: BlockSummary,
    pub quiz_type: QuizMode,
    pub quiz_words: Vec<ScoredWord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_questions: Option<u32>,
}

/// A word together with the caller's score for it, if they have one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, schemars::JsonSchema)]
pub struct ScoredWord {
    pub word: Word,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastery_level: Option<usize>,
}
