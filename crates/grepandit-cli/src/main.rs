//! CLI for grepandit.
//!
//! Drives the adaptive engine over a JSON state file: every command loads the
//! file, runs one engine operation, saves the state if the operation changed
//! it and prints the result as JSON on stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fs2::FileExt;
use grepandit_core::{AnswerSubmission, Meaning, NewQuestion, QuestionId, WordId};
use grepandit_engine::{
    AdaptiveEngine, EngineConfig, LexiconSource, MemoryStore, StoreSnapshot, DEFAULT_MAX_BATCH,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the state file
    #[arg(
        long,
        global = true,
        env = "GREPANDIT_STATE",
        default_value = "data/grepandit.state.json"
    )]
    state: PathBuf,

    /// Exploration rate of the category selector, in [0, 1]
    #[arg(long, global = true, env = "GREPANDIT_EPSILON", default_value_t = 0.2)]
    epsilon: f64,

    /// Largest accepted batch size
    #[arg(long, global = true, env = "GREPANDIT_MAX_BATCH", default_value_t = DEFAULT_MAX_BATCH)]
    max_batch: usize,

    /// Lemmatizer lexicon (TSV); the built-in English lexicon when absent
    #[arg(long, global = true, env = "GREPANDIT_LEXICON")]
    lexicon: Option<PathBuf>,

    /// Seed for every random choice, for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a vocabulary word (base form)
    AddWord {
        #[arg(long)]
        word: String,
        #[arg(long = "meaning")]
        meanings: Vec<String>,
    },
    /// Register a user
    AddUser {
        #[arg(long)]
        token: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Create a question from a JSON file and tag its vocabulary
    CreateQuestion {
        #[arg(long)]
        file: PathBuf,
    },
    /// Pick questions adapted to a user's ability
    Adaptive {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 5)]
        count: usize,
        /// Question ids already shown in this session
        #[arg(long)]
        exclude: Vec<QuestionId>,
    },
    /// Submit a graded answer
    Answer {
        #[arg(long)]
        user: String,
        #[arg(long)]
        question: QuestionId,
        #[arg(long, conflicts_with = "incorrect", required_unless_present = "incorrect")]
        correct: bool,
        #[arg(long)]
        incorrect: bool,
        #[arg(long = "answer")]
        answers: Vec<String>,
        /// Seconds spent on the question
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Show a user's ability profile
    Ability {
        #[arg(long)]
        user: String,
    },
    /// Summarize a user's answer history
    Stats {
        #[arg(long)]
        user: String,
    },
    /// List vocabulary from questions a user answered incorrectly
    ProblematicWords {
        #[arg(long)]
        user: String,
    },
    /// Pick questions that exercise the given vocabulary words
    PracticeVocab {
        #[arg(long = "word-id", required = true)]
        word_ids: Vec<WordId>,
        #[arg(long)]
        exclude: Vec<QuestionId>,
    },
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct AppState {
    #[serde(default)]
    store: StoreSnapshot,
    #[serde(default, with = "time::serde::iso8601::option")]
    last_saved: Option<OffsetDateTime>,
}

impl AppState {
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(path)?;
        let state = serde_json::from_reader(file)?;
        Ok(state)
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let dir = parent_dir(path);
        fs::create_dir_all(dir)?;
        self.last_saved = Some(OffsetDateTime::now_utc());
        // Write next to the target first so a failed write keeps the old state.
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)?;
        Ok(())
    }
}

/// Exclusive lock on `<state>.lock`. Held from load to save, so runs against
/// the same state file apply one after another. Released on drop.
struct StateLock {
    _file: File,
}

impl StateLock {
    fn acquire(state: &Path) -> Result<Self> {
        fs::create_dir_all(parent_dir(state))?;
        let path = lock_path(state);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to open lock file {}", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("failed to lock {}", path.display()))?;
        Ok(Self { _file: file })
    }
}

fn lock_path(state: &Path) -> PathBuf {
    let mut name = state.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

struct Outcome {
    output: Value,
    changed: bool,
}

impl Outcome {
    fn read<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            output: serde_json::to_value(value)?,
            changed: false,
        })
    }

    fn write<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            output: serde_json::to_value(value)?,
            changed: true,
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GREPANDIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(engine: &AdaptiveEngine<MemoryStore>, command: Commands, rng: &mut StdRng) -> Result<Outcome> {
    match command {
        Commands::AddWord { word, meanings } => {
            let word = word.trim().to_lowercase();
            if word.is_empty() || word.contains(char::is_whitespace) {
                anyhow::bail!("word must be a single non-empty token");
            }
            let meanings = meanings
                .into_iter()
                .map(|meaning| Meaning {
                    meaning,
                    ..Meaning::default()
                })
                .collect();
            Outcome::write(&engine.store().insert_word(&word, meanings))
        }
        Commands::AddUser { token, email } => Outcome::write(&engine.register_user(&token, email)?),
        Commands::CreateQuestion { file } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("failed to read question file {}", file.display()))?;
            let new: NewQuestion = serde_json::from_str(&content)
                .with_context(|| format!("invalid question in {}", file.display()))?;
            let question = engine.create_question(new)?;
            tracing::info!(id = question.id, words = question.vocabulary.len(), "question created");
            Outcome::write(&question)
        }
        Commands::Adaptive {
            user,
            count,
            exclude,
        } => {
            let batch = engine.adaptive_questions(&user, count, &exclude, rng)?;
            if batch.is_empty() {
                tracing::info!(user = %user, "no question matched any pick");
            }
            Outcome::read(&batch)
        }
        Commands::Answer {
            user,
            question,
            correct,
            incorrect,
            answers,
            duration,
        } => {
            debug_assert!(correct != incorrect);
            let submission = AnswerSubmission {
                question_id: question,
                correct,
                answers,
                duration_secs: duration,
            };
            Outcome::write(&engine.submit_answer(&user, &submission)?)
        }
        Commands::Ability { user } => Outcome::read(&engine.ability(&user)?),
        Commands::Stats { user } => Outcome::read(&engine.performance_report(&user)?),
        Commands::ProblematicWords { user } => Outcome::read(&engine.problematic_words(&user)?),
        Commands::PracticeVocab { word_ids, exclude } => {
            Outcome::read(&engine.questions_on_vocabulary(&word_ids, &exclude, rng)?)
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let _lock = StateLock::acquire(&cli.state)?;
    let mut state = AppState::load(&cli.state)
        .with_context(|| format!("failed to load state from {}", cli.state.display()))?;
    let mut store = MemoryStore::from_snapshot(std::mem::take(&mut state.store));
    let mut rng = match cli.seed {
        Some(seed) => {
            store = store.with_seed(seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let config = EngineConfig {
        epsilon: cli.epsilon,
        max_batch: cli.max_batch,
        lexicon: cli
            .lexicon
            .map_or(LexiconSource::English, LexiconSource::File),
        ..EngineConfig::default()
    };
    let engine = AdaptiveEngine::new(store, config).context("invalid engine configuration")?;

    let outcome = run(&engine, cli.command, &mut rng)?;
    if outcome.changed {
        state.store = engine.store().snapshot();
        state
            .save(&cli.state)
            .with_context(|| format!("failed to save state to {}", cli.state.display()))?;
    }

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &outcome.output)?;
    writeln!(stdout)?;
    Ok(())
}
