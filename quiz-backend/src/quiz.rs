//! Quiz flows: assembling questions, checking answers and reporting progress.
//!
//! Every flow takes the caller's identity as an `Option`. `None` is an
//! anonymous visitor: answers are still checked, nothing is persisted.

use std::collections::BTreeSet;
use std::sync::Arc;

use question_sampler::{DEFAULT_WRONG_OPTIONS, generate_options, sample_questions};
use word_bank::api::{
    AddToLearnedRequest, AddToLearnedResponse, BlockDetail, BlockSummary, BuildQuizRequest,
    CheckAnswerRequest, CheckAnswerResponse, ProfileProgress, Question, Quiz, QuizResults,
    QuizResultsRequest, ScoredWord,
};
use word_bank::scoring::is_correct_answer;
use word_bank::{
    Block, BlockProgress, ProgressionConfig, QuizMode, Word, WordId, is_fully_learned,
    score_answer,
};

use crate::error::{AppError, AppResult};
use crate::store::{Store, UserId};

pub const DEFAULT_LEARN_QUESTIONS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    /// Wrong options offered next to the correct translation.
    pub wrong_options: usize,
    /// Questions in a `learn` quiz for a known user.
    pub learn_questions: usize,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            wrong_options: DEFAULT_WRONG_OPTIONS,
            learn_questions: DEFAULT_LEARN_QUESTIONS,
        }
    }
}

pub fn parse_mode(tag: &str) -> AppResult<QuizMode> {
    tag.parse()
        .map_err(|_| AppError::UnknownQuizMode(tag.to_string()))
}

#[derive(Clone, Debug)]
pub struct QuizService {
    config: Arc<ProgressionConfig>,
    settings: QuizSettings,
}

impl QuizService {
    pub fn new(config: Arc<ProgressionConfig>, settings: QuizSettings) -> Self {
        Self { config, settings }
    }

    pub fn build_quiz(
        &self,
        store: &Store,
        request: &BuildQuizRequest,
        user: Option<UserId>,
    ) -> AppResult<Quiz> {
        let mode = parse_mode(&request.quiz_type)?;
        let block = find_block(store, &request.learning_block)?;
        let words = store.block_words(block.id)?;

        let questions = match (mode, user) {
            (QuizMode::Learn, Some(user)) => {
                let seen = seen_word_ids(store, user, &block)?;
                let fresh: Vec<Word> = words
                    .iter()
                    .filter(|word| !seen.contains(&word.id))
                    .cloned()
                    .collect();
                sample_questions(fresh, Some(self.settings.learn_questions))
                    .iter()
                    .map(learn_question)
                    .collect()
            }
            (QuizMode::Learn, None) => words.iter().map(learn_question).collect(),
            (QuizMode::MultipleChoice, _) => {
                self.with_options(sample_questions(words.clone(), None), &words)
            }
            (QuizMode::Review, Some(user)) => {
                let seen = store.block_words_seen(user, block.id)?;
                self.with_options(sample_questions(seen, None), &words)
            }
            (QuizMode::Review, None) => return Err(AppError::Unauthorized),
        };

        log::debug!(
            "built {mode} quiz for block {} with {} questions",
            block.slug,
            questions.len()
        );
        Ok(Quiz {
            quiz_type: mode,
            learning_block: block,
            questions,
        })
    }

    fn with_options(&self, sampled: Vec<Word>, block_words: &[Word]) -> Vec<Question> {
        sampled
            .into_iter()
            .map(|word| {
                let options = generate_options(
                    &word.translation,
                    block_words.iter().map(|w| w.translation.as_str()),
                    self.settings.wrong_options,
                );
                Question {
                    question_id: word.id,
                    name: word.name,
                    transliteration: word.transliteration,
                    translation: None,
                    audio: word.audio,
                    image: word.image,
                    options,
                }
            })
            .collect()
    }

    pub fn check_answer(
        &self,
        store: &mut Store,
        request: &CheckAnswerRequest,
        user: Option<UserId>,
    ) -> AppResult<CheckAnswerResponse> {
        let mode = parse_mode(&request.quiz_type)?;
        let rule = mode
            .point_rule()
            .ok_or(AppError::UnsupportedQuizMode(mode))?;
        let word = store
            .word(request.question_id)?
            .ok_or(AppError::WordNotFound(request.question_id))?;

        let is_correct = match user {
            Some(user) => {
                let record = store
                    .record_answer(
                        user,
                        word.id,
                        !mode.requires_identity(),
                        mode.experience_reward(),
                        |points| score_answer(&request.answer, &word.translation, points, rule),
                    )?
                    .ok_or(AppError::ScoreNotFound(word.id))?;
                log::debug!(
                    "user {user} answered word {} in {mode}: correct={} points={} experience={}",
                    word.id,
                    record.is_correct,
                    record.points,
                    record.experience
                );
                record.is_correct
            }
            None if mode.requires_identity() => return Err(AppError::Unauthorized),
            None => is_correct_answer(&request.answer, &word.translation),
        };

        let example_span = if is_correct {
            word.example_span()
        } else {
            String::new()
        };
        Ok(CheckAnswerResponse {
            is_correct,
            example_span,
        })
    }

    pub fn mark_learned(
        &self,
        store: &mut Store,
        request: &AddToLearnedRequest,
        user: Option<UserId>,
    ) -> AppResult<AddToLearnedResponse> {
        if store.word(request.question_id)?.is_none() {
            return Err(AppError::WordNotFound(request.question_id));
        }
        let Some(user) = user else {
            return Ok(AddToLearnedResponse {
                created: None,
                user_word_id: None,
                is_last: request.is_last,
            });
        };

        let record = store.mark_learned(
            user,
            request.question_id,
            QuizMode::Learn.experience_reward(),
        )?;
        if record.created {
            log::info!("user {user} learned word {}", request.question_id);
        }
        Ok(AddToLearnedResponse {
            created: Some(record.created),
            user_word_id: Some(record.score_id),
            is_last: request.is_last,
        })
    }

    pub fn profile(&self, store: &Store, user: Option<UserId>) -> AppResult<ProfileProgress> {
        let user = user.ok_or(AppError::Unauthorized)?;
        let profile = store.ensure_profile(user)?;
        Ok(ProfileProgress {
            level: self.config.experience.progress(profile.experience),
            num_learned_words: profile.num_learned_words,
        })
    }

    pub fn blocks(&self, store: &Store, user: Option<UserId>) -> AppResult<Vec<BlockSummary>> {
        store
            .blocks()?
            .into_iter()
            .map(|block| block_summary(store, block, user))
            .collect()
    }

    pub fn block_detail(
        &self,
        store: &Store,
        slug: &str,
        user: Option<UserId>,
    ) -> AppResult<BlockDetail> {
        let block = find_block(store, slug)?;
        let words = store.block_words(block.id)?;
        let levels = match user {
            Some(user) => Some(
                store
                    .block_scores(user, block.id)?
                    .iter()
                    .map(|score| score.mastery_level(&self.config.mastery))
                    .collect::<Vec<_>>(),
            ),
            None => None,
        };
        let progress = BlockProgress::new(levels.as_deref(), words.len(), &self.config.mastery);
        Ok(BlockDetail {
            block,
            words,
            progress,
        })
    }

    pub fn quiz_results(
        &self,
        store: &Store,
        request: &QuizResultsRequest,
        user: Option<UserId>,
    ) -> AppResult<QuizResults> {
        let mode = parse_mode(&request.quiz_type)?;
        let block = find_block(store, &request.learning_block)?;
        let quiz_words = request
            .quiz_words
            .iter()
            .map(|&word_id| self.scored_word(store, word_id, user))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(QuizResults {
            learning_block: block_summary(store, block, user)?,
            quiz_type: mode,
            quiz_words,
            quiz_score: request.quiz_score,
            num_questions: request.num_questions,
        })
    }

    fn scored_word(
        &self,
        store: &Store,
        word_id: WordId,
        user: Option<UserId>,
    ) -> AppResult<ScoredWord> {
        let word = store.word(word_id)?.ok_or(AppError::WordNotFound(word_id))?;
        let score = match user {
            Some(user) => store.word_score(user, word_id)?,
            None => None,
        };
        Ok(ScoredWord {
            word,
            points: score.as_ref().map(|s| s.points),
            mastery_level: score.as_ref().map(|s| s.mastery_level(&self.config.mastery)),
        })
    }

    /// The caller's own scored words in one block. Anonymous callers have none.
    pub fn block_words_for_user(
        &self,
        store: &Store,
        slug: &str,
        user: Option<UserId>,
    ) -> AppResult<Vec<ScoredWord>> {
        let block = find_block(store, slug)?;
        let Some(user) = user else {
            return Ok(Vec::new());
        };
        Ok(store
            .block_user_words(user, block.id)?
            .into_iter()
            .map(|(score, word)| ScoredWord {
                word,
                points: Some(score.points),
                mastery_level: Some(score.mastery_level(&self.config.mastery)),
            })
            .collect())
    }

    pub fn my_words(&self, store: &Store, user: Option<UserId>) -> AppResult<Vec<ScoredWord>> {
        let Some(user) = user else {
            return Ok(Vec::new());
        };
        Ok(store
            .user_scores(user)?
            .into_iter()
            .map(|(score, word)| ScoredWord {
                word,
                points: Some(score.points),
                mastery_level: Some(score.mastery_level(&self.config.mastery)),
            })
            .collect())
    }
}

fn find_block(store: &Store, slug: &str) -> AppResult<Block> {
    store
        .block_by_slug(slug)?
        .ok_or_else(|| AppError::BlockNotFound(slug.to_string()))
}

fn seen_word_ids(store: &Store, user: UserId, block: &Block) -> AppResult<BTreeSet<WordId>> {
    Ok(store
        .block_words_seen(user, block.id)?
        .into_iter()
        .map(|word| word.id)
        .collect())
}

fn block_summary(store: &Store, block: Block, user: Option<UserId>) -> AppResult<BlockSummary> {
    let fully_learned = match user {
        Some(user) => is_fully_learned(
            store.block_scores(user, block.id)?.len(),
            store.block_word_count(block.id)?,
        ),
        None => false,
    };
    Ok(BlockSummary {
        block,
        fully_learned,
    })
}

fn learn_question(word: &Word) -> Question {
    Question {
        question_id: word.id,
        name: word.name.clone(),
        transliteration: word.transliteration.clone(),
        translation: Some(word.translation.clone()),
        audio: word.audio.clone(),
        image: word.image.clone(),
        options: Vec::new(),
    }
}
