//! Configuration loaded from `config.yaml` in the scribe home.
//!
//! Every field has a default so a missing config file is valid: the
//! binary runs out of the box with one "Reflection" journal topic and
//! the stock OpenAI endpoint.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Reasoning-engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Path of the persisted conversation memory (JSONL).
    #[serde(default = "default_memory_file")]
    pub memory_file: PathBuf,
    /// Path of the append-only journal file.
    #[serde(default = "default_journal_file")]
    pub journal_file: PathBuf,
    /// Reserved input token requesting a memory clear.
    #[serde(default = "default_clear_token")]
    pub clear_token: String,
    /// Journaling-session settings.
    #[serde(default)]
    pub journal: JournalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            memory_file: default_memory_file(),
            journal_file: default_journal_file(),
            clear_token: default_clear_token(),
            journal: JournalConfig::default(),
        }
    }
}

fn default_memory_file() -> PathBuf {
    crate::scribe_home().join("chat_history.jsonl")
}

fn default_journal_file() -> PathBuf {
    crate::scribe_home().join("journal.txt")
}

fn default_clear_token() -> String {
    "<clear>".to_string()
}

/// Settings for the concrete reasoning engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Model name sent in the request body.
    #[serde(default = "default_model")]
    pub model: String,
    /// Chat-completions endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum completion length in tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Optional path of a file holding the API key (one line, trimmed).
    /// The `OPENAI_API_KEY` environment variable takes precedence.
    #[serde(default)]
    pub api_key_file: Option<PathBuf>,
    /// Names of auxiliary tools the engine may use. Advisory only:
    /// the core never dispatches these itself.
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key_file: None,
            tools: default_tools(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_endpoint() -> String {
    crate::engine::openai::DEFAULT_ENDPOINT.to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    512
}

fn default_tools() -> Vec<String> {
    vec![
        "search".to_string(),
        "calculator".to_string(),
        "weather".to_string(),
        "news".to_string(),
    ]
}

/// Settings for the journaling interview.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JournalConfig {
    /// Minimum number of questions requested per topic.
    #[serde(default = "default_min_questions")]
    pub min_questions: usize,
    /// Maximum follow-up questions generated per answered question.
    /// `0` disables follow-ups.
    #[serde(default = "default_max_followups")]
    pub max_followups: usize,
    /// Interview topics.
    #[serde(default = "default_topics")]
    pub topics: Vec<Topic>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            min_questions: default_min_questions(),
            max_followups: default_max_followups(),
            topics: default_topics(),
        }
    }
}

fn default_min_questions() -> usize {
    3
}

fn default_max_followups() -> usize {
    1
}

fn default_topics() -> Vec<Topic> {
    vec![Topic {
        name: "Reflection".to_string(),
        description: "questions about your day, thoughts, and feelings.".to_string(),
    }]
}

/// A named interview category used to seed question generation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Topic {
    pub name: String,
    pub description: String,
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read config {}", path.display()));
            }
        };
        serde_yaml_ng::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }
}
