//! Reasoning-engine abstraction.
//!
//! Defines the [`ReasoningEngine`] trait — the single boundary the
//! rest of the crate talks through — plus the [`EngineError`] kinds
//! and the concrete [`OpenAIEngine`] implementation.

pub mod openai;

use async_trait::async_trait;

use crate::memory::Turn;

/// Failures of a reasoning-engine call. None of these are fatal for
/// the process: the conversation loop reports them and continues.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Transport-level failure (connect, timeout, TLS …).
    #[error("engine request failed")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("engine returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The response decoded but did not carry a usable completion.
    #[error("engine response malformed: {0}")]
    Malformed(String),
}

/// The external reasoning engine, treated as an opaque
/// text-in/text-out collaborator.
///
/// `context` is the full ordered turn history; `prompt` is the new
/// input. Sampling temperature and output length are configuration of
/// the concrete engine, not per-call parameters.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    async fn complete(&self, context: &[Turn], prompt: &str) -> Result<String, EngineError>;
}

pub use openai::OpenAIEngine;
