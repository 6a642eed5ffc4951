//! Reading word lists for bulk import.

use std::io::BufRead;

use crate::store::NewWord;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// One JSON word record per line. Blank lines are skipped.
pub fn read_words<R: BufRead>(reader: R) -> Result<Vec<NewWord>, ImportError> {
    let mut words = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let word = serde_json::from_str(&line).map_err(|source| ImportError::Parse {
            line: index + 1,
            source,
        })?;
        words.push(word);
    }
    Ok(words)
}
