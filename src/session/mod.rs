//! The interactive conversation session.
//!
//! A small state machine mediating between operator input, the
//! reasoning engine, and the memory store. Each non-empty input
//! dispatches to the engine and, on success, appends one turn and
//! persists the whole buffer. Engine failures are reported and leave
//! the buffer untouched. An empty input terminates the session after
//! exactly one final save.
//!
//! The reserved clear token does not clear unconditionally: the
//! session first asks the *engine* for consent and only resets the
//! buffer when the reply contains "yes" (case-insensitively). Asking
//! the engine rather than the operator is deliberate, preserved
//! behavior.

use tracing::{debug, info, warn};

use crate::engine::ReasoningEngine;
use crate::memory::{MemoryBuffer, MemoryError, MemoryStore, Turn};

/// Consent prompt sent to the engine when a clear is requested.
const CLEAR_CONSENT_PROMPT: &str = "The operator has asked to clear our conversation memory. \
     Do you consent to erasing the conversation so far? Answer yes or no.";

/// Result of feeding one operator input through the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Normal turn: the engine replied and the turn was persisted.
    Reply(String),
    /// The engine call failed; the buffer was not mutated and the
    /// session remains usable.
    EngineFailed(String),
    /// The clear was consented to; the buffer is now empty and
    /// persisted.
    Cleared,
    /// The engine withheld consent; the buffer and file are untouched.
    /// Carries the engine's refusal reply.
    ClearRefused(String),
    /// Empty input: the session is over, one final save performed.
    Terminated,
}

/// Drives the turn-taking loop around one [`MemoryBuffer`].
pub struct ConversationSession {
    engine: Box<dyn ReasoningEngine>,
    store: MemoryStore,
    buffer: MemoryBuffer,
    clear_token: String,
}

impl ConversationSession {
    /// Start a session, reloading prior memory from the store.
    pub async fn start(
        engine: Box<dyn ReasoningEngine>,
        store: MemoryStore,
        clear_token: impl Into<String>,
    ) -> Result<Self, MemoryError> {
        let buffer = store.load().await?;
        info!(turns = buffer.len(), "conversation memory loaded");
        Ok(Self {
            engine,
            store,
            buffer,
            clear_token: clear_token.into(),
        })
    }

    /// Start a session with an empty buffer, ignoring any persisted
    /// state. The old file survives until the first save.
    pub fn start_fresh(
        engine: Box<dyn ReasoningEngine>,
        store: MemoryStore,
        clear_token: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            store,
            buffer: Vec::new(),
            clear_token: clear_token.into(),
        }
    }

    /// The in-memory turn history.
    pub fn buffer(&self) -> &[Turn] {
        &self.buffer
    }

    /// Feed one operator input through the state machine.
    ///
    /// Engine failures are recovered into [`TurnOutcome::EngineFailed`];
    /// only persistence failures surface as `Err`, and those are fatal
    /// for the turn, not for the session.
    pub async fn handle_input(&mut self, input: &str) -> Result<TurnOutcome, MemoryError> {
        if input.is_empty() {
            self.store.save(&self.buffer).await?;
            info!(turns = self.buffer.len(), "session terminated, memory saved");
            return Ok(TurnOutcome::Terminated);
        }

        if input == self.clear_token {
            return self.handle_clear().await;
        }

        let reply = match self.engine.complete(&self.buffer, input).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "engine call failed, turn not committed");
                return Ok(TurnOutcome::EngineFailed(e.to_string()));
            }
        };

        self.buffer.push(Turn::exchange(input, &reply));
        self.store.save(&self.buffer).await?;
        debug!(turns = self.buffer.len(), "turn persisted");
        Ok(TurnOutcome::Reply(reply))
    }

    /// Consent-gated clear: ask the engine, scan for "yes".
    async fn handle_clear(&mut self) -> Result<TurnOutcome, MemoryError> {
        let reply = match self
            .engine
            .complete(&self.buffer, CLEAR_CONSENT_PROMPT)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "consent check failed, memory untouched");
                return Ok(TurnOutcome::EngineFailed(e.to_string()));
            }
        };

        if reply.to_lowercase().contains("yes") {
            self.buffer.clear();
            self.store.save(&self.buffer).await?;
            info!("conversation memory cleared");
            Ok(TurnOutcome::Cleared)
        } else {
            info!("clear refused by engine, memory untouched");
            Ok(TurnOutcome::ClearRefused(reply))
        }
    }
}
