//! scribe — conversational assistant with persisted memory and a
//! guided journaling interview.
//!
//! This library crate re-exports modules so integration tests
//! (under `tests/`) can access them.

pub mod config;
pub mod engine;
pub mod journal;
pub mod memory;
pub mod secrets;
pub mod session;

/// Return the scribe home directory.
///
/// Resolution order:
/// 1. `SCRIBE_HOME` environment variable
/// 2. `$HOME/.scribe`
pub fn scribe_home() -> std::path::PathBuf {
    if let Ok(p) = std::env::var("SCRIBE_HOME") {
        std::path::PathBuf::from(p)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join(".scribe")
    }
}
