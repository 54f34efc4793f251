//! Conversational memory: `Turn`, `MemoryBuffer`, and `MemoryStore`.
//!
//! The buffer is the literal context window handed to the reasoning
//! engine, so insertion order is significant.  On disk it is a plain
//! JSONL file — one JSON object per turn per line — rewritten
//! wholesale on every save.  Decoding is strict: a single malformed
//! line fails the whole load rather than silently dropping state.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

/// Prefix tagging the operator's half of a turn.
pub const HUMAN_PREFIX: &str = "Human: ";
/// Prefix tagging the engine's half of a turn.
pub const AI_PREFIX: &str = "AI: ";

// ── Turn ─────────────────────────────────────────────────────

/// One exchange unit in the memory buffer, serialised as a single
/// JSONL line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker-tagged operator line (`Human: …`).
    pub key: String,
    /// Speaker-tagged engine line (`AI: …`).
    pub value: String,
}

impl Turn {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Build a turn from raw (untagged) operator input and engine reply.
    pub fn exchange(input: &str, reply: &str) -> Self {
        Self {
            key: format!("{HUMAN_PREFIX}{input}"),
            value: format!("{AI_PREFIX}{reply}"),
        }
    }
}

/// Ordered conversational context. Owned by exactly one session per
/// process run.
pub type MemoryBuffer = Vec<Turn>;

// ── Errors ───────────────────────────────────────────────────

/// Failures of the persistence layer, distinguishable so callers can
/// recover differently per kind.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The memory file does not exist. `load` maps this to an empty
    /// buffer; `load_strict` surfaces it.
    #[error("no memory file at {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but a line is not a valid turn record. Callers
    /// must not proceed with partial state.
    #[error("corrupt memory file at line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Underlying read/write failure. Fatal for the operation, not
    /// for the process.
    #[error("memory file I/O failed")]
    Io(#[from] io::Error),
}

// ── MemoryStore ──────────────────────────────────────────────

/// Durable JSONL persistence for a [`MemoryBuffer`] at a fixed path.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the whole buffer, truncating and rewriting the file.
    ///
    /// Creates parent directories as needed. Not an append: the file
    /// after a save is exactly the encoding of `buffer`.
    pub async fn save(&self, buffer: &[Turn]) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut out = String::new();
        for turn in buffer {
            let line = serde_json::to_string(turn)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            out.push_str(&line);
            out.push('\n');
        }

        fs::write(&self.path, out).await?;
        debug!(path = %self.path.display(), turns = buffer.len(), "memory saved");
        Ok(())
    }

    /// Load the buffer, treating a missing file as empty.
    pub async fn load(&self) -> Result<MemoryBuffer, MemoryError> {
        match self.load_strict().await {
            Ok(buffer) => Ok(buffer),
            Err(MemoryError::NotFound(_)) => {
                debug!(path = %self.path.display(), "no memory file, starting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Load the buffer, surfacing a missing file as
    /// [`MemoryError::NotFound`].
    pub async fn load_strict(&self) -> Result<MemoryBuffer, MemoryError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MemoryError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut buffer = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let turn = serde_json::from_str::<Turn>(line).map_err(|source| {
                MemoryError::Corrupt {
                    line: idx + 1,
                    source,
                }
            })?;
            buffer.push(turn);
        }

        Ok(buffer)
    }

    /// Delete the memory file. Absence is not an error.
    pub async fn clear(&self) -> Result<(), MemoryError> {
        match fs::remove_file(&self.path).await {
            Ok(_) => {
                debug!(path = %self.path.display(), "memory file removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────
