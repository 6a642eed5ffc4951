use std::net::SocketAddr;
use std::path::PathBuf;

use crate::quiz::QuizSettings;

pub const DEFAULT_DATABASE: &str = "word_bank.sqlite3";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub quiz: QuizSettings,
}

impl ServerConfig {
    /// Read the configuration from the process environment (after `.env` has
    /// been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = QuizSettings::default();
        let jwt_secret = lookup("WORD_BANK_JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("WORD_BANK_JWT_SECRET"))?;

        Ok(Self {
            database_path: lookup("WORD_BANK_DATABASE")
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
                .into(),
            bind_addr: parse_or(&lookup, "WORD_BANK_BIND", DEFAULT_BIND.parse().ok())?,
            jwt_secret,
            quiz: QuizSettings {
                wrong_options: parse_or(
                    &lookup,
                    "WORD_BANK_WRONG_OPTIONS",
                    Some(defaults.wrong_options),
                )?,
                learn_questions: parse_or(
                    &lookup,
                    "WORD_BANK_LEARN_QUESTIONS",
                    Some(defaults.learn_questions),
                )?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}
