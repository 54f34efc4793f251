//! API-key resolution.
//!
//! Resolution order:
//! 1. `OPENAI_API_KEY` environment variable
//! 2. the `engine.api_key_file` path from the config (one line, trimmed)
//!
//! A key read from file is exported back into the process environment
//! before any engine call, matching how the surrounding tooling
//! expects to find it.

use std::path::Path;

use anyhow::Context;
use tracing::debug;

/// Environment variable carrying the engine API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Resolve the engine API key, exporting it into the environment when
/// it came from a file.
pub fn resolve_api_key(api_key_file: Option<&Path>) -> anyhow::Result<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        let key = key.trim().to_string();
        if !key.is_empty() {
            debug!("API key resolved from environment");
            return Ok(key);
        }
    }

    let path = api_key_file.with_context(|| {
        format!("{API_KEY_ENV} is not set and no engine.api_key_file is configured")
    })?;

    let key = std::fs::read_to_string(path)
        .with_context(|| format!("read API key file {}", path.display()))?
        .trim()
        .to_string();
    if key.is_empty() {
        anyhow::bail!("API key file {} is empty", path.display());
    }

    std::env::set_var(API_KEY_ENV, &key);
    debug!(path = %path.display(), "API key resolved from file");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests touch process-wide env state; the lock keeps them
    // from racing each other, and each restores what it changes.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn file_key_is_trimmed() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key.txt");
        std::fs::write(&key_path, "  sk-test-123\n").unwrap();

        let saved = std::env::var(API_KEY_ENV).ok();
        std::env::remove_var(API_KEY_ENV);

        let key = resolve_api_key(Some(&key_path)).unwrap();
        assert_eq!(key, "sk-test-123");
        assert_eq!(std::env::var(API_KEY_ENV).unwrap(), "sk-test-123");

        match saved {
            Some(v) => std::env::set_var(API_KEY_ENV, v),
            None => std::env::remove_var(API_KEY_ENV),
        }
    }

    #[test]
    fn missing_everything_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        let saved = std::env::var(API_KEY_ENV).ok();
        std::env::remove_var(API_KEY_ENV);

        assert!(resolve_api_key(None).is_err());

        match saved {
            Some(v) => std::env::set_var(API_KEY_ENV, v),
            None => std::env::remove_var(API_KEY_ENV),
        }
    }
}
