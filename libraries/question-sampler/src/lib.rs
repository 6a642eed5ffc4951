//! Randomized quiz assembly: picking the questions for a quiz and the answer
//! options shown for each question.
//!
//! Question sets are padded by repetition when the candidate pool is smaller
//! than the requested size, so a short block still produces a full quiz.
//! Wrong options are drawn with a cryptographically strong generator so the
//! position of the correct answer can't be predicted from earlier quizzes.
//!
//! # Example
//!
//! ```
//! use question_sampler::{generate_options, sample_questions};
//!
//! let words = vec!["cat", "dog", "bird", "fish"];
//! let quiz = sample_questions(words, Some(10));
//! assert_eq!(quiz.len(), 10); // padded, so some words appear twice
//!
//! let options = generate_options("chat", ["chien", "oiseau", "poisson"], 3);
//! assert_eq!(options.len(), 4);
//! assert!(options.iter().any(|option| option == "chat"));
//! ```

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng, RngCore};

/// Number of questions in a quiz when the caller doesn't ask for a size.
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Upper bound on the number of questions in a single quiz.
pub const MAX_QUESTION_COUNT: usize = 100;

/// Number of wrong options shown next to the correct answer.
pub const DEFAULT_WRONG_OPTIONS: usize = 3;

/// How many questions a quiz built from `pool_len` candidates will contain.
///
/// Without an explicit request this is `min(10, pool_len)`. An explicit
/// request is clamped to `1..=100` and may exceed the pool size, in which case
/// the pool gets tiled (see [`sample_questions`]).
pub fn question_count(pool_len: usize, requested: Option<usize>) -> usize {
    match requested {
        None => DEFAULT_QUESTION_COUNT.min(pool_len),
        Some(n) => n.clamp(1, MAX_QUESTION_COUNT),
    }
}

/// Sample a quiz from `candidates` using the thread-local generator.
///
/// See [`sample_questions_with`] for the exact rules.
pub fn sample_questions<T: Clone>(candidates: Vec<T>, n_questions: Option<usize>) -> Vec<T> {
    sample_questions_with(candidates, n_questions, &mut rand::thread_rng())
}

/// Sample a quiz from `candidates`.
///
/// * An empty pool yields an empty quiz.
/// * The size is decided by [`question_count`].
/// * When more questions are requested than there are candidates, the pool is
///   repeated `n / len + 1` times before sampling, so the same candidate can
///   show up more than once in the result.
/// * The result is a uniform sample without replacement from the (possibly
///   tiled) pool, in random order.
pub fn sample_questions_with<T, R>(
    candidates: Vec<T>,
    n_questions: Option<usize>,
    rng: &mut R,
) -> Vec<T>
where
    T: Clone,
    R: Rng,
{
    if candidates.is_empty() {
        return Vec::new();
    }

    let count = question_count(candidates.len(), n_questions);

    let mut pool = if count > candidates.len() {
        let repetition_factor = count / candidates.len() + 1;
        let tiled_len = candidates.len() * repetition_factor;
        candidates.iter().cycle().take(tiled_len).cloned().collect()
    } else {
        candidates
    };

    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

/// Build the option list for a multiple-choice question using OS entropy.
///
/// See [`generate_options_with`] for the exact rules.
pub fn generate_options<I, S>(correct: &str, pool: I, n_wrong: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    generate_options_with(correct, pool, n_wrong, &mut OsRng)
}

/// Build the option list for a multiple-choice question.
///
/// Up to `n_wrong` wrong options are drawn from `pool` without replacement.
/// Duplicates in the pool and entries equal to `correct` are ignored, so the
/// correct answer appears exactly once and no wrong option repeats. A pool
/// that runs dry simply produces fewer options.
///
/// The assembled list is ordered by a fresh random key per element.
pub fn generate_options_with<I, S, R>(
    correct: &str,
    pool: I,
    n_wrong: usize,
    rng: &mut R,
) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    R: RngCore + CryptoRng,
{
    let mut remaining: Vec<String> = Vec::new();
    for candidate in pool {
        let candidate = candidate.into();
        if candidate != correct && !remaining.contains(&candidate) {
            remaining.push(candidate);
        }
    }

    let mut options = Vec::with_capacity(n_wrong.min(remaining.len()) + 1);
    options.push(correct.to_string());

    for _ in 0..n_wrong {
        if remaining.is_empty() {
            break;
        }
        let pick = rng.gen_range(0..remaining.len());
        options.push(remaining.swap_remove(pick));
    }

    options.sort_by_cached_key(|_| rng.next_u64());
    options
}
