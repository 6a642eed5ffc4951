use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quiz_backend::config::DEFAULT_DATABASE;
use quiz_backend::import::read_words;
use quiz_backend::store::Store;

/// Maintenance commands for the word bank database
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database
    #[arg(short, long, env = "WORD_BANK_DATABASE", default_value = DEFAULT_DATABASE)]
    database: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print counts of words, users and user words
    Report,
    /// Create a learning block from a JSONL word list
    ImportBlock {
        /// Block name; the slug is derived from it
        #[arg(short, long)]
        name: String,

        /// One JSON word record per line
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long)]
        description: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let mut store = Store::open(&args.database)
        .with_context(|| format!("failed to open {}", args.database.display()))?;

    match args.command {
        Command::Report => {
            let report = store.usage_report()?;
            println!("Report at {}", chrono::Utc::now().to_rfc3339());
            println!("Words: {}", report.words);
            println!("Users: {}", report.users);
            println!("User words: {}", report.user_words);
        }
        Command::ImportBlock {
            name,
            file,
            description,
        } => {
            let reader = BufReader::new(
                File::open(&file).with_context(|| format!("failed to open {}", file.display()))?,
            );
            let words = read_words(reader)?;
            let (block, words) = store.import_block(&name, description.as_deref(), &words)?;
            log::info!("imported block {} ({} words)", block.slug, words.len());
            println!("Created block {} with {} words", block.slug, words.len());
        }
    }
    Ok(())
}
