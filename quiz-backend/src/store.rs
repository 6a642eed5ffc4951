//! SQLite persistence for blocks, words, profiles and word scores.
//!
//! Every mutation of a word's points or a profile's experience runs inside an
//! immediate transaction that reads the current value right before the new
//! one is computed, so concurrent answers for the same user can't lose
//! updates.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use serde::Deserialize;
use uuid::Uuid;
use word_bank::scoring::LEARNED_WORD_POINTS;
use word_bank::{
    Block, BlockId, MasteryThresholds, ScoredAnswer, Word, WordId, apply_experience, slugify,
};

pub type UserId = Uuid;

pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS blocks (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    description TEXT,
    theory TEXT,
    added_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    transliteration TEXT NOT NULL,
    translation TEXT NOT NULL,
    example TEXT,
    example_image TEXT,
    audio TEXT,
    image TEXT,
    added_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS block_words (
    block_id INTEGER NOT NULL REFERENCES blocks(id) ON DELETE CASCADE,
    word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
    PRIMARY KEY (block_id, word_id)
);

CREATE INDEX IF NOT EXISTS idx_block_words_word_id ON block_words(word_id);

CREATE TABLE IF NOT EXISTS profiles (
    user_id BLOB PRIMARY KEY,
    experience INTEGER NOT NULL DEFAULT 0 CHECK (experience >= 0),
    num_learned_words INTEGER NOT NULL DEFAULT 0 CHECK (num_learned_words >= 0),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS word_scores (
    id INTEGER PRIMARY KEY,
    user_id BLOB NOT NULL REFERENCES profiles(user_id) ON DELETE CASCADE,
    word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
    points INTEGER NOT NULL DEFAULT 0 CHECK (points BETWEEN 0 AND 100),
    added_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (user_id, word_id)
);

CREATE INDEX IF NOT EXISTS idx_word_scores_user_id ON word_scores(user_id);
"#;

const WORD_COLUMNS: &str =
    "w.id, w.name, w.transliteration, w.translation, w.example, w.example_image, w.audio, w.image";
const SCORE_COLUMNS: &str = "s.id, s.user_id, s.word_id, s.points, s.added_at, s.updated_at";
const BLOCK_COLUMNS: &str = "b.id, b.name, b.slug, b.description, b.theory";

#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub user_id: UserId,
    pub experience: u64,
    pub num_learned_words: u64,
    pub created_at: DateTime<Utc>,
}

/// A user's point score for one word.
#[derive(Clone, Debug, PartialEq)]
pub struct WordScore {
    pub id: i64,
    pub user_id: UserId,
    pub word_id: WordId,
    pub points: u32,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WordScore {
    pub fn mastery_level(&self, thresholds: &MasteryThresholds) -> usize {
        thresholds.mastery_level(self.points)
    }
}

/// A word as it appears in an import file.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct NewWord {
    pub name: String,
    pub transliteration: String,
    pub translation: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub example_image: Option<String>,
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnswerRecord {
    pub score_id: i64,
    pub created: bool,
    pub is_correct: bool,
    pub points: u32,
    pub experience: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LearnedRecord {
    pub score_id: i64,
    pub created: bool,
    pub experience: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsageReport {
    pub words: u64,
    pub users: u64,
    pub user_words: u64,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ---- blocks and words ----

    pub fn create_block(
        &self,
        name: &str,
        description: Option<&str>,
        theory: Option<&str>,
    ) -> rusqlite::Result<Block> {
        insert_block(&self.conn, name, description, theory)
    }

    pub fn create_word(&self, word: &NewWord) -> rusqlite::Result<Word> {
        insert_word(&self.conn, word)
    }

    pub fn add_word_to_block(&self, block_id: BlockId, word_id: WordId) -> rusqlite::Result<()> {
        link_word(&self.conn, block_id, word_id)
    }

    /// Create a block and all of its words in one transaction.
    pub fn import_block(
        &mut self,
        name: &str,
        description: Option<&str>,
        words: &[NewWord],
    ) -> rusqlite::Result<(Block, Vec<Word>)> {
        let tx = self.conn.transaction()?;
        let block = insert_block(&tx, name, description, None)?;
        let mut created = Vec::with_capacity(words.len());
        for word in words {
            let word = insert_word(&tx, word)?;
            link_word(&tx, block.id, word.id)?;
            created.push(word);
        }
        tx.commit()?;
        Ok((block, created))
    }

    pub fn blocks(&self) -> rusqlite::Result<Vec<Block>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {BLOCK_COLUMNS} FROM blocks b ORDER BY b.id"))?;
        let blocks = stmt.query_map([], block_from_row)?.collect();
        blocks
    }

    pub fn block_by_slug(&self, slug: &str) -> rusqlite::Result<Option<Block>> {
        self.conn
            .query_row(
                &format!("SELECT {BLOCK_COLUMNS} FROM blocks b WHERE b.slug = ?1"),
                [slug],
                block_from_row,
            )
            .optional()
    }

    pub fn word(&self, word_id: WordId) -> rusqlite::Result<Option<Word>> {
        self.conn
            .query_row(
                &format!("SELECT {WORD_COLUMNS} FROM words w WHERE w.id = ?1"),
                [word_id],
                |row| word_from_row(row, 0),
            )
            .optional()
    }

    pub fn block_words(&self, block_id: BlockId) -> rusqlite::Result<Vec<Word>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WORD_COLUMNS} FROM words w
             JOIN block_words bw ON bw.word_id = w.id
             WHERE bw.block_id = ?1
             ORDER BY w.id"
        ))?;
        let words = stmt.query_map([block_id], |row| word_from_row(row, 0))?.collect();
        words
    }

    pub fn block_word_count(&self, block_id: BlockId) -> rusqlite::Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM block_words WHERE block_id = ?1",
            [block_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    // ---- profiles ----

    /// Fetch the user's profile, creating an empty one on first use.
    pub fn ensure_profile(&self, user: UserId) -> rusqlite::Result<Profile> {
        insert_profile(&self.conn, user)?;
        self.conn
            .query_row(
                "SELECT user_id, experience, num_learned_words, created_at
                 FROM profiles WHERE user_id = ?1",
                [user],
                profile_from_row,
            )
    }

    /// Apply a signed experience change, clamped at zero. Returns the new total.
    pub fn add_experience(&mut self, user: UserId, delta: i64) -> rusqlite::Result<u64> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        insert_profile(&tx, user)?;
        let experience = change_experience(&tx, user, delta)?;
        tx.commit()?;
        Ok(experience)
    }

    // ---- word scores ----

    pub fn word_score(
        &self,
        user: UserId,
        word_id: WordId,
    ) -> rusqlite::Result<Option<WordScore>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {SCORE_COLUMNS} FROM word_scores s
                     WHERE s.user_id = ?1 AND s.word_id = ?2"
                ),
                params![user, word_id],
                |row| score_from_row(row, 0),
            )
            .optional()
    }

    /// The user's scores for words in a block.
    pub fn block_scores(
        &self,
        user: UserId,
        block_id: BlockId,
    ) -> rusqlite::Result<Vec<WordScore>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SCORE_COLUMNS} FROM word_scores s
             JOIN block_words bw ON bw.word_id = s.word_id
             WHERE s.user_id = ?1 AND bw.block_id = ?2
             ORDER BY s.id"
        ))?;
        let scores = stmt
            .query_map(params![user, block_id], |row| score_from_row(row, 0))?
            .collect();
        scores
    }

    /// Words of a block the user has already attempted.
    pub fn block_words_seen(
        &self,
        user: UserId,
        block_id: BlockId,
    ) -> rusqlite::Result<Vec<Word>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WORD_COLUMNS} FROM words w
             JOIN block_words bw ON bw.word_id = w.id
             JOIN word_scores s ON s.word_id = w.id
             WHERE s.user_id = ?1 AND bw.block_id = ?2
             ORDER BY w.id"
        ))?;
        let words = stmt
            .query_map(params![user, block_id], |row| word_from_row(row, 0))?
            .collect();
        words
    }

    /// The user's scores for words in a block, with their words.
    pub fn block_user_words(
        &self,
        user: UserId,
        block_id: BlockId,
    ) -> rusqlite::Result<Vec<(WordScore, Word)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SCORE_COLUMNS}, {WORD_COLUMNS} FROM word_scores s
             JOIN words w ON w.id = s.word_id
             JOIN block_words bw ON bw.word_id = s.word_id
             WHERE s.user_id = ?1 AND bw.block_id = ?2
             ORDER BY s.id"
        ))?;
        let scores = stmt
            .query_map(params![user, block_id], |row| {
                Ok((score_from_row(row, 0)?, word_from_row(row, 6)?))
            })?
            .collect();
        scores
    }

    /// All of the user's scores with their words, newest first.
    pub fn user_scores(&self, user: UserId) -> rusqlite::Result<Vec<(WordScore, Word)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SCORE_COLUMNS}, {WORD_COLUMNS} FROM word_scores s
             JOIN words w ON w.id = s.word_id
             WHERE s.user_id = ?1
             ORDER BY s.added_at DESC, s.id DESC"
        ))?;
        let scores = stmt
            .query_map([user], |row| Ok((score_from_row(row, 0)?, word_from_row(row, 6)?)))?
            .collect();
        scores
    }

    /// Score an answer against the stored points for `(user, word)`.
    ///
    /// `score` receives the current points and decides the new ones. A missing
    /// score row is created at 0 points when `create_if_missing` is set;
    /// otherwise nothing is written and `None` is returned. A correct answer
    /// also adds `experience_reward` to the user's profile.
    pub fn record_answer<F>(
        &mut self,
        user: UserId,
        word_id: WordId,
        create_if_missing: bool,
        experience_reward: u64,
        score: F,
    ) -> rusqlite::Result<Option<AnswerRecord>>
    where
        F: FnOnce(u32) -> ScoredAnswer,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        insert_profile(&tx, user)?;
        let now = Utc::now();

        let existing: Option<(i64, u32)> = tx
            .query_row(
                "SELECT id, points FROM word_scores WHERE user_id = ?1 AND word_id = ?2",
                params![user, word_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (score_id, current, created) = match existing {
            Some((score_id, points)) => (score_id, points, false),
            None if create_if_missing => {
                tx.execute(
                    "INSERT INTO word_scores (user_id, word_id, points, added_at, updated_at)
                     VALUES (?1, ?2, 0, ?3, ?3)",
                    params![user, word_id, now],
                )?;
                (tx.last_insert_rowid(), 0, true)
            }
            None => return Ok(None),
        };

        let scored = score(current);
        tx.execute(
            "UPDATE word_scores SET points = ?1, updated_at = ?2 WHERE id = ?3",
            params![scored.points, now, score_id],
        )?;

        let experience = if scored.is_correct {
            change_experience(&tx, user, clamp_to_i64(experience_reward))?
        } else {
            read_experience(&tx, user)?
        };

        tx.commit()?;
        Ok(Some(AnswerRecord {
            score_id,
            created,
            is_correct: scored.is_correct,
            points: scored.points,
            experience,
        }))
    }

    /// Mark a word as learned: the first time creates its score at
    /// [`LEARNED_WORD_POINTS`], bumps the learned-word counter and grants
    /// `experience_reward`. Later calls change nothing.
    pub fn mark_learned(
        &mut self,
        user: UserId,
        word_id: WordId,
        experience_reward: u64,
    ) -> rusqlite::Result<LearnedRecord> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        insert_profile(&tx, user)?;
        let now = Utc::now();

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO word_scores (user_id, word_id, points, added_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![user, word_id, LEARNED_WORD_POINTS, now],
        )?;
        let created = inserted == 1;

        let experience = if created {
            tx.execute(
                "UPDATE profiles SET num_learned_words = num_learned_words + 1 WHERE user_id = ?1",
                [user],
            )?;
            change_experience(&tx, user, clamp_to_i64(experience_reward))?
        } else {
            read_experience(&tx, user)?
        };

        let score_id = tx.query_row(
            "SELECT id FROM word_scores WHERE user_id = ?1 AND word_id = ?2",
            params![user, word_id],
            |row| row.get(0),
        )?;

        tx.commit()?;
        Ok(LearnedRecord {
            score_id,
            created,
            experience,
        })
    }

    pub fn usage_report(&self) -> rusqlite::Result<UsageReport> {
        let count = |table: &str| -> rusqlite::Result<u64> {
            let count: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        };
        Ok(UsageReport {
            words: count("words")?,
            users: count("profiles")?,
            user_words: count("word_scores")?,
        })
    }
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn insert_block(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    theory: Option<&str>,
) -> rusqlite::Result<Block> {
    let slug = slugify(name);
    let now = Utc::now();
    conn.execute(
        "INSERT INTO blocks (name, slug, description, theory, added_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![name, slug, description, theory, now],
    )?;
    Ok(Block {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        slug,
        description: description.map(str::to_string),
        theory: theory.map(str::to_string),
    })
}

fn insert_word(conn: &Connection, word: &NewWord) -> rusqlite::Result<Word> {
    conn.execute(
        "INSERT INTO words
             (name, transliteration, translation, example, example_image, audio, image, added_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            word.name,
            word.transliteration,
            word.translation,
            word.example,
            word.example_image,
            word.audio,
            word.image,
            Utc::now(),
        ],
    )?;
    Ok(Word {
        id: conn.last_insert_rowid(),
        name: word.name.clone(),
        transliteration: word.transliteration.clone(),
        translation: word.translation.clone(),
        example: word.example.clone(),
        example_image: word.example_image.clone(),
        audio: word.audio.clone(),
        image: word.image.clone(),
    })
}

fn link_word(conn: &Connection, block_id: BlockId, word_id: WordId) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO block_words (block_id, word_id) VALUES (?1, ?2)",
        params![block_id, word_id],
    )?;
    Ok(())
}

fn insert_profile(conn: &Connection, user: UserId) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO profiles (user_id, created_at) VALUES (?1, ?2)",
        params![user, Utc::now()],
    )?;
    Ok(())
}

fn read_experience(conn: &Connection, user: UserId) -> rusqlite::Result<u64> {
    let experience: i64 = conn.query_row(
        "SELECT experience FROM profiles WHERE user_id = ?1",
        [user],
        |row| row.get(0),
    )?;
    Ok(experience.max(0) as u64)
}

fn change_experience(conn: &Connection, user: UserId, delta: i64) -> rusqlite::Result<u64> {
    let experience = apply_experience(read_experience(conn, user)?, delta);
    conn.execute(
        "UPDATE profiles SET experience = ?1 WHERE user_id = ?2",
        params![clamp_to_i64(experience), user],
    )?;
    Ok(experience)
}

fn block_from_row(row: &Row<'_>) -> rusqlite::Result<Block> {
    Ok(Block {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        theory: row.get(4)?,
    })
}

fn word_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Word> {
    Ok(Word {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        transliteration: row.get(offset + 2)?,
        translation: row.get(offset + 3)?,
        example: row.get(offset + 4)?,
        example_image: row.get(offset + 5)?,
        audio: row.get(offset + 6)?,
        image: row.get(offset + 7)?,
    })
}

fn score_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<WordScore> {
    Ok(WordScore {
        id: row.get(offset)?,
        user_id: row.get(offset + 1)?,
        word_id: row.get(offset + 2)?,
        points: row.get(offset + 3)?,
        added_at: row.get(offset + 4)?,
        updated_at: row.get(offset + 5)?,
    })
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    let experience: i64 = row.get(1)?;
    let num_learned_words: i64 = row.get(2)?;
    Ok(Profile {
        user_id: row.get(0)?,
        experience: experience.max(0) as u64,
        num_learned_words: num_learned_words.max(0) as u64,
        created_at: row.get(3)?,
    })
}
